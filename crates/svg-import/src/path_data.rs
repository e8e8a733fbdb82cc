//! SVG path data (`d` attribute) parsing.
//!
//! Supports the full command set `M L H V C S Q T A Z` in absolute and
//! relative form, implicit command repetition (a move-to followed by bare
//! coordinate pairs continues as line-to), and the compact number syntax
//! (`1.5.5`, `10-5`, `1e-3`, packed arc flags).

use block_types::{PathSegment, Point2, VectorPath, PATH_TOLERANCE};

use crate::types::PathDataError;

const COMMANDS: &[u8] = b"MmLlHhVvCcSsQqTtAaZz";

/// Parse a path data string into a [`VectorPath`].
///
/// An empty (or whitespace-only) string yields an empty path.
pub fn parse_path_data(data: &str) -> Result<VectorPath, PathDataError> {
    let mut parser = PathParser::new(data);
    parser.run()?;
    Ok(VectorPath::new(parser.segments))
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a str) -> Self {
        Self {
            bytes: data.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn skip_separators(&mut self) {
        while let Some(b) = self.peek() {
            if b.is_ascii_whitespace() || b == b',' {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn next_command(&mut self) -> Result<Option<u8>, PathDataError> {
        self.skip_separators();
        match self.peek() {
            None => Ok(None),
            Some(b) if COMMANDS.contains(&b) => {
                self.pos += 1;
                Ok(Some(b))
            }
            Some(b) => Err(PathDataError::new(
                self.pos,
                format!("expected a command, found '{}'", b as char),
            )),
        }
    }

    fn starts_number(&mut self) -> bool {
        self.skip_separators();
        matches!(self.peek(), Some(b'0'..=b'9' | b'.' | b'-' | b'+'))
    }

    fn digits(&mut self) -> usize {
        let start = self.pos;
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.pos += 1;
        }
        self.pos - start
    }

    fn number(&mut self) -> Result<f64, PathDataError> {
        self.skip_separators();
        let start = self.pos;
        if matches!(self.peek(), Some(b'-' | b'+')) {
            self.pos += 1;
        }
        let mut mantissa = self.digits();
        if self.peek() == Some(b'.') {
            self.pos += 1;
            mantissa += self.digits();
        }
        if mantissa == 0 {
            self.pos = start;
            return Err(PathDataError::new(start, "expected a number"));
        }
        if matches!(self.peek(), Some(b'e' | b'E')) {
            let mark = self.pos;
            self.pos += 1;
            if matches!(self.peek(), Some(b'-' | b'+')) {
                self.pos += 1;
            }
            if self.digits() == 0 {
                self.pos = mark;
            }
        }
        // The scanned range is ASCII by construction.
        let text = std::str::from_utf8(&self.bytes[start..self.pos])
            .map_err(|e| PathDataError::new(start, e.to_string()))?;
        text.parse::<f64>()
            .map_err(|e| PathDataError::new(start, format!("bad number '{text}': {e}")))
    }

    fn flag(&mut self) -> Result<bool, PathDataError> {
        self.skip_separators();
        let value = match self.peek() {
            Some(b'0') => false,
            Some(b'1') => true,
            _ => return Err(PathDataError::new(self.pos, "expected an arc flag (0 or 1)")),
        };
        self.pos += 1;
        Ok(value)
    }
}

struct PathParser<'a> {
    cursor: Cursor<'a>,
    segments: Vec<PathSegment>,
    current: Point2,
    subpath_start: Point2,
    /// Second control point of the previous cubic, for `S`.
    last_cubic: Option<Point2>,
    /// Control point of the previous quadratic, for `T`.
    last_quadratic: Option<Point2>,
}

impl<'a> PathParser<'a> {
    fn new(data: &'a str) -> Self {
        Self {
            cursor: Cursor::new(data),
            segments: Vec::new(),
            current: Point2::default(),
            subpath_start: Point2::default(),
            last_cubic: None,
            last_quadratic: None,
        }
    }

    fn run(&mut self) -> Result<(), PathDataError> {
        let mut first = true;
        while let Some(command) = self.cursor.next_command()? {
            if first && !matches!(command, b'M' | b'm') {
                return Err(PathDataError::new(
                    self.cursor.pos - 1,
                    "path data must begin with a move-to",
                ));
            }
            first = false;
            let relative = command.is_ascii_lowercase();

            match command.to_ascii_uppercase() {
                b'M' => {
                    let p = self.point(relative)?;
                    self.move_to(p);
                    while self.cursor.starts_number() {
                        let p = self.point(relative)?;
                        self.line_to(p);
                    }
                }
                b'L' => self.repeat(|s| {
                    let p = s.point(relative)?;
                    s.line_to(p);
                    Ok(())
                })?,
                b'H' => self.repeat(|s| {
                    let mut x = s.cursor.number()?;
                    if relative {
                        x += s.current.x;
                    }
                    s.line_to(Point2::new(x, s.current.y));
                    Ok(())
                })?,
                b'V' => self.repeat(|s| {
                    let mut y = s.cursor.number()?;
                    if relative {
                        y += s.current.y;
                    }
                    s.line_to(Point2::new(s.current.x, y));
                    Ok(())
                })?,
                b'C' => self.repeat(|s| {
                    let c1 = s.point(relative)?;
                    let c2 = s.point(relative)?;
                    let end = s.point(relative)?;
                    s.cubic_to(c1, c2, end);
                    Ok(())
                })?,
                b'S' => self.repeat(|s| {
                    let c1 = s.reflect(s.last_cubic);
                    let c2 = s.point(relative)?;
                    let end = s.point(relative)?;
                    s.cubic_to(c1, c2, end);
                    Ok(())
                })?,
                b'Q' => self.repeat(|s| {
                    let c = s.point(relative)?;
                    let end = s.point(relative)?;
                    s.quadratic_to(c, end);
                    Ok(())
                })?,
                b'T' => self.repeat(|s| {
                    let c = s.reflect(s.last_quadratic);
                    let end = s.point(relative)?;
                    s.quadratic_to(c, end);
                    Ok(())
                })?,
                b'A' => self.repeat(|s| {
                    let rx = s.cursor.number()?.abs();
                    let ry = s.cursor.number()?.abs();
                    let rotation = s.cursor.number()?;
                    let large_arc = s.cursor.flag()?;
                    let sweep = s.cursor.flag()?;
                    let end = s.point(relative)?;
                    s.arc_to((rx, ry), rotation, large_arc, sweep, end);
                    Ok(())
                })?,
                _ => self.close(),
            }
        }
        Ok(())
    }

    /// Run `op` once, then again for every further argument group.
    fn repeat(
        &mut self,
        mut op: impl FnMut(&mut Self) -> Result<(), PathDataError>,
    ) -> Result<(), PathDataError> {
        op(self)?;
        while self.cursor.starts_number() {
            op(self)?;
        }
        Ok(())
    }

    fn point(&mut self, relative: bool) -> Result<Point2, PathDataError> {
        let x = self.cursor.number()?;
        let y = self.cursor.number()?;
        Ok(if relative {
            Point2::new(self.current.x + x, self.current.y + y)
        } else {
            Point2::new(x, y)
        })
    }

    /// Mirror `control` through the current point, or the current point
    /// itself when the previous command was of another kind.
    fn reflect(&self, control: Option<Point2>) -> Point2 {
        match control {
            Some(c) => Point2::new(2.0 * self.current.x - c.x, 2.0 * self.current.y - c.y),
            None => self.current,
        }
    }

    fn advance(&mut self, segment: PathSegment) {
        self.current = segment.end();
        self.segments.push(segment);
    }

    fn move_to(&mut self, p: Point2) {
        self.current = p;
        self.subpath_start = p;
        self.last_cubic = None;
        self.last_quadratic = None;
    }

    fn line_to(&mut self, end: Point2) {
        self.last_cubic = None;
        self.last_quadratic = None;
        self.advance(PathSegment::Line {
            start: self.current,
            end,
        });
    }

    fn cubic_to(&mut self, control1: Point2, control2: Point2, end: Point2) {
        self.last_cubic = Some(control2);
        self.last_quadratic = None;
        self.advance(PathSegment::CubicBezier {
            start: self.current,
            control1,
            control2,
            end,
        });
    }

    fn quadratic_to(&mut self, control: Point2, end: Point2) {
        self.last_cubic = None;
        self.last_quadratic = Some(control);
        self.advance(PathSegment::QuadraticBezier {
            start: self.current,
            control,
            end,
        });
    }

    fn arc_to(&mut self, radius: (f64, f64), rotation: f64, large_arc: bool, sweep: bool, end: Point2) {
        self.last_cubic = None;
        self.last_quadratic = None;
        self.advance(PathSegment::EllipticalArc {
            start: self.current,
            end,
            radius,
            rotation,
            large_arc,
            sweep,
        });
    }

    fn close(&mut self) {
        if !self.current.approx_eq(&self.subpath_start, PATH_TOLERANCE) {
            self.line_to(self.subpath_start);
        }
        self.current = self.subpath_start;
        self.last_cubic = None;
        self.last_quadratic = None;
    }
}
