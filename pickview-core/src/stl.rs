/// STL file parser for binary and ASCII formats
use nalgebra::{Point3, Vector3};
use nom::{
    bytes::complete::{tag, take},
    character::complete::{multispace0, multispace1, not_line_ending, space0},
    combinator::opt,
    multi::{count, many0},
    number::complete::{float, le_f32, le_u16, le_u32},
    sequence::{preceded, tuple},
    IResult,
};

use crate::error::{ViewerError, ViewerResult};
use crate::geometry::{MeshGeometry, Triangle};

const HEADER_LEN: usize = 80;
const FACET_LEN: usize = 50;

/// Parse a binary STL file
pub fn parse_binary_stl(data: &[u8]) -> ViewerResult<MeshGeometry> {
    if data.len() < HEADER_LEN + 4 {
        return Err(ViewerError::MeshParse(
            "file too small to be a valid STL".to_string(),
        ));
    }

    let (body, triangle_count) = binary_header(data).map_err(|e| {
        ViewerError::MeshParse(format!("invalid binary STL header: {:?}", e))
    })?;
    let triangle_count = triangle_count as usize;

    if body.len() < triangle_count * FACET_LEN {
        return Err(ViewerError::MeshParse(format!(
            "unexpected end of file: header declares {} triangles",
            triangle_count
        )));
    }

    let (_, facets) = count(binary_facet, triangle_count)(body)
        .map_err(|e| ViewerError::MeshParse(format!("invalid binary STL facet: {:?}", e)))?;

    let mut geometry = MeshGeometry::with_capacity(triangle_count);
    for (normal, triangle) in facets {
        push_facet(&mut geometry, normal, triangle);
    }

    Ok(geometry)
}

fn binary_header(input: &[u8]) -> IResult<&[u8], u32> {
    preceded(take(HEADER_LEN), le_u32)(input)
}

fn binary_vector(input: &[u8]) -> IResult<&[u8], (f32, f32, f32)> {
    tuple((le_f32, le_f32, le_f32))(input)
}

fn binary_facet(input: &[u8]) -> IResult<&[u8], (Vector3<f32>, Triangle)> {
    let (input, n) = binary_vector(input)?;
    let (input, v1) = binary_vector(input)?;
    let (input, v2) = binary_vector(input)?;
    let (input, v3) = binary_vector(input)?;
    // Attribute byte count is unused
    let (input, _) = le_u16(input)?;

    Ok((
        input,
        (
            Vector3::new(n.0, n.1, n.2),
            Triangle::new(point(v1), point(v2), point(v3)),
        ),
    ))
}

/// Parse an ASCII STL file
pub fn parse_ascii_stl(input: &str) -> ViewerResult<MeshGeometry> {
    match parse_ascii_stl_impl(input) {
        Ok((_, geometry)) => Ok(geometry),
        Err(e) => Err(ViewerError::MeshParse(format!(
            "failed to parse ASCII STL: {:?}",
            e
        ))),
    }
}

fn parse_ascii_stl_impl(input: &str) -> IResult<&str, MeshGeometry> {
    let (input, _) = preceded(multispace0, tag("solid"))(input)?;
    let (input, _) = preceded(space0, not_line_ending)(input)?; // Optional name
    let (input, facets) = many0(parse_facet)(input)?;
    let (input, _) = preceded(multispace0, tag("endsolid"))(input)?;
    let (input, _) = opt(preceded(space0, not_line_ending))(input)?;

    let mut geometry = MeshGeometry::with_capacity(facets.len());
    for (normal, triangle) in facets {
        push_facet(&mut geometry, normal, triangle);
    }

    Ok((input, geometry))
}

fn parse_facet(input: &str) -> IResult<&str, (Vector3<f32>, Triangle)> {
    let (input, _) = preceded(multispace0, tag("facet"))(input)?;
    let (input, _) = preceded(multispace1, tag("normal"))(input)?;
    let (input, normal) = parse_vector3(input)?;
    let (input, _) = preceded(multispace0, tag("outer"))(input)?;
    let (input, _) = preceded(multispace1, tag("loop"))(input)?;
    let (input, v1) = parse_vertex(input)?;
    let (input, v2) = parse_vertex(input)?;
    let (input, v3) = parse_vertex(input)?;
    let (input, _) = preceded(multispace0, tag("endloop"))(input)?;
    let (input, _) = preceded(multispace0, tag("endfacet"))(input)?;

    Ok((
        input,
        (
            Vector3::new(normal.0, normal.1, normal.2),
            Triangle::new(point(v1), point(v2), point(v3)),
        ),
    ))
}

fn parse_vertex(input: &str) -> IResult<&str, (f32, f32, f32)> {
    let (input, _) = preceded(multispace0, tag("vertex"))(input)?;
    parse_vector3(input)
}

fn parse_vector3(input: &str) -> IResult<&str, (f32, f32, f32)> {
    let (input, _) = multispace0(input)?;
    let (input, x) = float(input)?;
    let (input, _) = multispace1(input)?;
    let (input, y) = float(input)?;
    let (input, _) = multispace1(input)?;
    let (input, z) = float(input)?;
    Ok((input, (x, y, z)))
}

fn point(v: (f32, f32, f32)) -> Point3<f32> {
    Point3::new(v.0, v.1, v.2)
}

/// Use the stored facet normal unless the exporter left it zeroed.
fn push_facet(geometry: &mut MeshGeometry, normal: Vector3<f32>, triangle: Triangle) {
    match normal.try_normalize(f32::EPSILON) {
        Some(n) => geometry.push_triangle_with_normals(triangle, [n; 3]),
        None => geometry.push_triangle(triangle),
    }
}

/// Detect and parse STL file (binary or ASCII)
pub fn parse_stl(data: &[u8]) -> ViewerResult<MeshGeometry> {
    // Binary files may also start with "solid", so fall back on failure
    if data.len() > 5 && &data[0..5] == b"solid" {
        if let Ok(text) = std::str::from_utf8(data) {
            if let Ok(geometry) = parse_ascii_stl(text) {
                return Ok(geometry);
            }
        }
    }

    parse_binary_stl(data)
}
