/// Primitive topology of a tessellation session.
///
/// Discriminants follow the classic immediate-mode numbering so callers that
/// store modes as integers keep working (`7` is quads).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum DrawMode {
    Points = 0,
    Lines = 1,
    LineLoop = 2,
    LineStrip = 3,
    Triangles = 4,
    TriangleStrip = 5,
    TriangleFan = 6,
    Quads = 7,
    QuadStrip = 8,
    Polygon = 9,
}

impl DrawMode {
    /// Parses a numeric mode code. Returns `None` for unknown codes.
    pub fn from_code(code: u32) -> Option<Self> {
        Some(match code {
            0 => DrawMode::Points,
            1 => DrawMode::Lines,
            2 => DrawMode::LineLoop,
            3 => DrawMode::LineStrip,
            4 => DrawMode::Triangles,
            5 => DrawMode::TriangleStrip,
            6 => DrawMode::TriangleFan,
            7 => DrawMode::Quads,
            8 => DrawMode::QuadStrip,
            9 => DrawMode::Polygon,
            _ => return None,
        })
    }

    #[inline]
    pub fn code(self) -> u32 {
        self as u32
    }

    /// Number of vertices that make up one independent primitive.
    ///
    /// Strip, fan, loop and polygon modes share vertices, so any count is a
    /// whole number of primitives for them and this returns 1.
    pub fn vertices_per_primitive(self) -> u32 {
        match self {
            DrawMode::Lines => 2,
            DrawMode::Triangles => 3,
            DrawMode::Quads => 4,
            _ => 1,
        }
    }

    /// Mode actually submitted to the backend.
    ///
    /// Quads become triangles when the session converts them.
    #[inline]
    pub fn submitted(self, convert_quads: bool) -> Self {
        if self == DrawMode::Quads && convert_quads {
            DrawMode::Triangles
        } else {
            self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip_for_every_mode() {
        for code in 0..10 {
            let mode = DrawMode::from_code(code).unwrap();
            assert_eq!(mode.code(), code);
        }
        assert_eq!(DrawMode::from_code(10), None);
    }

    #[test]
    fn quads_submit_as_triangles_only_when_converting() {
        assert_eq!(DrawMode::Quads.submitted(true), DrawMode::Triangles);
        assert_eq!(DrawMode::Quads.submitted(false), DrawMode::Quads);
        assert_eq!(DrawMode::Lines.submitted(true), DrawMode::Lines);
    }

    #[test]
    fn primitive_sizes() {
        assert_eq!(DrawMode::Quads.vertices_per_primitive(), 4);
        assert_eq!(DrawMode::Triangles.vertices_per_primitive(), 3);
        assert_eq!(DrawMode::TriangleFan.vertices_per_primitive(), 1);
    }
}
