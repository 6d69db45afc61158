//! `.blunder` scene file parser.
//!
//! The format is line based. A file starts with a `#BLUNDER` header and is
//! followed by sections, each opened by a `#NAME` line:
//!
//! ```text
//! #BLUNDER
//!
//! #SETTINGS
//! screen_width 400
//! screen_height 225
//! samples 20
//! bounces 10
//!
//! #CAMERA
//! position 0 0 1
//! look_at 0 0 -1
//! fov 90
//! up_direction 0 1 0
//! focus_distance 2        // optional
//! focus_angle 0.5         // optional
//!
//! #COLORS
//! red 1 0 0
//!
//! #MATERIALS              // optional
//! chrome metal 0.8 0.8 0.8 0.1
//! glass dielectric 1.5
//! matte lambertian 0.5 0.5 0.5
//!
//! #SPHERES
//! 0 0 -1 red 0.5
//! 1 0 -1 chrome 0.5 1 0.2 -1     // trailing point makes it move
//!
//! #TRIANGLES              // optional
//! -1 -1 -3 1 -1 -3 0 1 -3 glass
//! ```
//!
//! Blank lines and `//` comments are ignored. Materials must be defined
//! before the primitives that use them.

use std::path::Path;
use std::str::SplitWhitespace;

use blunder_math::util::{
    ensure_finite, ensure_finite_vec, ensure_in_range, ensure_positive, ensure_unit_range,
};
use blunder_math::{GeometryError, Interval, Vec3};
use thiserror::Error;

use crate::scene::{
    CameraDescription, MaterialDescription, NamedMaterial, RenderSettings, SceneDescription,
    SphereDescription, TriangleDescription,
};

/// Errors that can occur while reading a scene file.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Missing #BLUNDER header")]
    MissingHeader,

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Invalid number '{token}' at line {line}")]
    InvalidNumber { line: usize, token: String },

    #[error("Unknown section '{name}' at line {line}")]
    UnknownSection { line: usize, name: String },

    #[error("Section {name} repeated at line {line}")]
    DuplicateSection { line: usize, name: &'static str },

    #[error("Missing required section {0}")]
    MissingSection(&'static str),

    #[error("Missing '{key}' in {section}")]
    MissingKey {
        section: &'static str,
        key: &'static str,
    },

    #[error("Undefined material '{name}' at line {line}")]
    UndefinedMaterial { line: usize, name: String },

    #[error("Material '{name}' redefined at line {line}")]
    DuplicateMaterial { line: usize, name: String },

    #[error("Invalid material '{name}' at line {line}: {source}")]
    InvalidMaterial {
        line: usize,
        name: String,
        #[source]
        source: GeometryError,
    },

    #[error("Invalid value at line {line}: {source}")]
    Invalid {
        line: usize,
        #[source]
        source: GeometryError,
    },
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Settings,
    Camera,
    Colors,
    Materials,
    Spheres,
    Triangles,
}

impl Section {
    const ALL: [Section; 6] = [
        Section::Settings,
        Section::Camera,
        Section::Colors,
        Section::Materials,
        Section::Spheres,
        Section::Triangles,
    ];

    fn header(self) -> &'static str {
        match self {
            Section::Settings => "#SETTINGS",
            Section::Camera => "#CAMERA",
            Section::Colors => "#COLORS",
            Section::Materials => "#MATERIALS",
            Section::Spheres => "#SPHERES",
            Section::Triangles => "#TRIANGLES",
        }
    }

    fn from_header(header: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.header() == header)
    }

    fn is_required(self) -> bool {
        !matches!(self, Section::Materials | Section::Triangles)
    }
}

const FILE_HEADER: &str = "#BLUNDER";

/// Tokens of one content line.
struct Tokens<'a> {
    line: usize,
    inner: SplitWhitespace<'a>,
}

impl<'a> Tokens<'a> {
    fn new(line: usize, text: &'a str) -> Self {
        Self {
            line,
            inner: text.split_whitespace(),
        }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::Parse {
            line: self.line,
            message: message.into(),
        }
    }

    fn invalid(&self, source: GeometryError) -> ParseError {
        ParseError::Invalid {
            line: self.line,
            source,
        }
    }

    fn word(&mut self, what: &str) -> ParseResult<&'a str> {
        self.inner
            .next()
            .ok_or_else(|| self.error(format!("expected {what}")))
    }

    fn number<T: std::str::FromStr>(&mut self, what: &str) -> ParseResult<T> {
        let token = self.word(what)?;
        token.parse().map_err(|_| ParseError::InvalidNumber {
            line: self.line,
            token: token.to_string(),
        })
    }

    fn float(&mut self, what: &'static str) -> ParseResult<f32> {
        let value = self.number(what)?;
        ensure_finite(what, value).map_err(|e| self.invalid(e))
    }

    fn vec3(&mut self, what: &'static str) -> ParseResult<Vec3> {
        let v = Vec3::new(self.number(what)?, self.number(what)?, self.number(what)?);
        ensure_finite_vec(what, v).map_err(|e| self.invalid(e))
    }

    fn color(&mut self, what: &'static str) -> ParseResult<Vec3> {
        let c = self.vec3(what)?;
        ensure_unit_range(what, c).map_err(|e| self.invalid(e))
    }

    fn positive(&mut self, what: &'static str) -> ParseResult<f32> {
        let value = self.float(what)?;
        ensure_positive(what, value).map_err(|e| self.invalid(e))
    }

    fn unit(&mut self, what: &'static str) -> ParseResult<f32> {
        let value = self.float(what)?;
        ensure_in_range(what, value, Interval::new(0.0, 1.0)).map_err(|e| self.invalid(e))
    }

    fn at_end(&self) -> bool {
        self.inner.clone().next().is_none()
    }

    fn finish(mut self) -> ParseResult<()> {
        match self.inner.next() {
            None => Ok(()),
            Some(extra) => Err(self.error(format!("unexpected trailing token '{extra}'"))),
        }
    }
}

/// Key/value pairs of a section, each key allowed at most once.
struct Keys<T> {
    section: &'static str,
    values: Vec<(&'static str, T)>,
}

impl<T: Copy> Keys<T> {
    fn new(section: Section) -> Self {
        Self {
            section: section.header(),
            values: Vec::new(),
        }
    }

    fn insert(&mut self, line: usize, key: &'static str, value: T) -> ParseResult<()> {
        if self.get(key).is_some() {
            return Err(ParseError::Parse {
                line,
                message: format!("duplicate key '{key}' in {}", self.section),
            });
        }
        self.values.push((key, value));
        Ok(())
    }

    fn get(&self, key: &str) -> Option<T> {
        self.values.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
    }

    fn require(&self, key: &'static str) -> ParseResult<T> {
        self.get(key).ok_or(ParseError::MissingKey {
            section: self.section,
            key,
        })
    }
}

/// `.blunder` file parser.
pub struct BlunderParser {
    section: Option<Section>,
    seen: Vec<Section>,
    settings: Keys<u32>,
    camera_vectors: Keys<Vec3>,
    camera_scalars: Keys<f32>,
    description: SceneDescription,
}

impl Default for BlunderParser {
    fn default() -> Self {
        Self::new()
    }
}

impl BlunderParser {
    /// Create a parser with no sections read yet.
    pub fn new() -> Self {
        Self {
            section: None,
            seen: Vec::new(),
            settings: Keys::new(Section::Settings),
            camera_vectors: Keys::new(Section::Camera),
            camera_scalars: Keys::new(Section::Camera),
            description: SceneDescription::default(),
        }
    }

    /// Parse a whole file.
    pub fn parse(mut self, content: &str) -> ParseResult<SceneDescription> {
        let mut lines = content
            .lines()
            .enumerate()
            .map(|(i, text)| (i + 1, strip_comment(text).trim()))
            .filter(|(_, text)| !text.is_empty());

        match lines.next() {
            Some((_, FILE_HEADER)) => {}
            _ => return Err(ParseError::MissingHeader),
        }

        for (line, text) in lines {
            if text.starts_with('#') {
                self.enter_section(line, text)?;
            } else {
                self.parse_line(Tokens::new(line, text))?;
            }
        }

        self.finish()
    }

    fn enter_section(&mut self, line: usize, header: &str) -> ParseResult<()> {
        if header == FILE_HEADER {
            return Err(ParseError::DuplicateSection {
                line,
                name: FILE_HEADER,
            });
        }

        let section = Section::from_header(header).ok_or_else(|| ParseError::UnknownSection {
            line,
            name: header.to_string(),
        })?;

        if self.seen.contains(&section) {
            return Err(ParseError::DuplicateSection {
                line,
                name: section.header(),
            });
        }

        self.seen.push(section);
        self.section = Some(section);
        Ok(())
    }

    fn parse_line(&mut self, tokens: Tokens<'_>) -> ParseResult<()> {
        match self.section {
            None => Err(tokens.error("expected a section header")),
            Some(Section::Settings) => self.parse_setting(tokens),
            Some(Section::Camera) => self.parse_camera(tokens),
            Some(Section::Colors) => self.parse_color(tokens),
            Some(Section::Materials) => self.parse_material(tokens),
            Some(Section::Spheres) => self.parse_sphere(tokens),
            Some(Section::Triangles) => self.parse_triangle(tokens),
        }
    }

    fn parse_setting(&mut self, mut tokens: Tokens<'_>) -> ParseResult<()> {
        let key = match tokens.word("a setting name")? {
            "screen_width" => "screen_width",
            "screen_height" => "screen_height",
            "samples" => "samples",
            "bounces" => "bounces",
            other => return Err(tokens.error(format!("unknown setting '{other}'"))),
        };
        let value = tokens.number(key)?;
        let line = tokens.line;
        tokens.finish()?;
        self.settings.insert(line, key, value)
    }

    fn parse_camera(&mut self, mut tokens: Tokens<'_>) -> ParseResult<()> {
        let line = tokens.line;
        match tokens.word("a camera key")? {
            "position" => {
                let v = tokens.vec3("camera position")?;
                tokens.finish()?;
                self.camera_vectors.insert(line, "position", v)
            }
            "look_at" => {
                let v = tokens.vec3("camera look_at")?;
                tokens.finish()?;
                self.camera_vectors.insert(line, "look_at", v)
            }
            "up_direction" => {
                let v = tokens.vec3("camera up_direction")?;
                tokens.finish()?;
                self.camera_vectors.insert(line, "up_direction", v)
            }
            "fov" => {
                let v = tokens.float("camera fov")?;
                tokens.finish()?;
                self.camera_scalars.insert(line, "fov", v)
            }
            "focus_distance" => {
                let v = tokens.float("camera focus_distance")?;
                tokens.finish()?;
                self.camera_scalars.insert(line, "focus_distance", v)
            }
            "focus_angle" => {
                let v = tokens.float("camera focus_angle")?;
                tokens.finish()?;
                self.camera_scalars.insert(line, "focus_angle", v)
            }
            other => Err(tokens.error(format!("unknown camera key '{other}'"))),
        }
    }

    fn parse_color(&mut self, mut tokens: Tokens<'_>) -> ParseResult<()> {
        let name = tokens.word("a color name")?;
        let albedo = tokens.color("color").map_err(|e| name_material(e, name))?;
        let line = tokens.line;
        tokens.finish()?;
        self.define_material(line, name, MaterialDescription::Lambertian { albedo })
    }

    fn parse_material(&mut self, mut tokens: Tokens<'_>) -> ParseResult<()> {
        let name = tokens.word("a material name")?;
        let material = material_body(&mut tokens).map_err(|e| name_material(e, name))?;
        let line = tokens.line;
        tokens.finish()?;
        self.define_material(line, name, material)
    }

    fn define_material(
        &mut self,
        line: usize,
        name: &str,
        material: MaterialDescription,
    ) -> ParseResult<()> {
        if self.description.material(name).is_some() {
            return Err(ParseError::DuplicateMaterial {
                line,
                name: name.to_string(),
            });
        }
        self.description.materials.push(NamedMaterial {
            name: name.to_string(),
            material,
        });
        Ok(())
    }

    fn material_ref(&self, line: usize, name: &str) -> ParseResult<String> {
        match self.description.material(name) {
            Some(_) => Ok(name.to_string()),
            None => Err(ParseError::UndefinedMaterial {
                line,
                name: name.to_string(),
            }),
        }
    }

    fn parse_sphere(&mut self, mut tokens: Tokens<'_>) -> ParseResult<()> {
        let line = tokens.line;
        let center = tokens.vec3("sphere center")?;
        let material = self.material_ref(line, tokens.word("a material name")?)?;
        let radius = tokens.positive("sphere radius")?;
        let center_end = if tokens.at_end() {
            None
        } else {
            Some(tokens.vec3("sphere end center")?)
        };
        tokens.finish()?;

        self.description.spheres.push(SphereDescription {
            center,
            center_end,
            radius,
            material,
            line,
        });
        Ok(())
    }

    fn parse_triangle(&mut self, mut tokens: Tokens<'_>) -> ParseResult<()> {
        let line = tokens.line;
        let vertices = [
            tokens.vec3("triangle vertex")?,
            tokens.vec3("triangle vertex")?,
            tokens.vec3("triangle vertex")?,
        ];
        let material = self.material_ref(line, tokens.word("a material name")?)?;
        tokens.finish()?;

        self.description.triangles.push(TriangleDescription {
            vertices,
            material,
            line,
        });
        Ok(())
    }

    fn finish(mut self) -> ParseResult<SceneDescription> {
        if let Some(missing) = Section::ALL
            .into_iter()
            .find(|s| s.is_required() && !self.seen.contains(s))
        {
            return Err(ParseError::MissingSection(missing.header()));
        }

        self.description.settings = RenderSettings {
            width: self.settings.require("screen_width")?,
            height: self.settings.require("screen_height")?,
            samples: self.settings.require("samples")?,
            bounces: self.settings.require("bounces")?,
        };

        self.description.camera = CameraDescription {
            position: self.camera_vectors.require("position")?,
            look_at: self.camera_vectors.require("look_at")?,
            fov: self.camera_scalars.require("fov")?,
            up_direction: self.camera_vectors.require("up_direction")?,
            focus_distance: self.camera_scalars.get("focus_distance"),
            focus_angle: self.camera_scalars.get("focus_angle").unwrap_or(0.0),
        };

        Ok(self.description)
    }
}

fn material_body(tokens: &mut Tokens<'_>) -> ParseResult<MaterialDescription> {
    let material = match tokens.word("a material kind")? {
        "lambertian" => MaterialDescription::Lambertian {
            albedo: tokens.color("lambertian albedo")?,
        },
        "metal" => {
            let albedo = tokens.color("metal albedo")?;
            // Fuzz is optional and defaults to a perfect mirror
            let fuzz = if tokens.at_end() {
                0.0
            } else {
                tokens.unit("metal fuzz")?
            };
            MaterialDescription::Metal { albedo, fuzz }
        }
        "dielectric" => MaterialDescription::Dielectric {
            ior: tokens.positive("index of refraction")?,
        },
        other => return Err(tokens.error(format!("unknown material kind '{other}'"))),
    };
    Ok(material)
}

/// Attach the material name to a value error raised while reading it.
fn name_material(error: ParseError, name: &str) -> ParseError {
    match error {
        ParseError::Invalid { line, source } => ParseError::InvalidMaterial {
            line,
            name: name.to_string(),
            source,
        },
        other => other,
    }
}

fn strip_comment(line: &str) -> &str {
    match line.find("//") {
        Some(pos) => &line[..pos],
        None => line,
    }
}

/// Parse `.blunder` content into a scene description.
pub fn parse_blunder(content: &str) -> ParseResult<SceneDescription> {
    BlunderParser::new().parse(content)
}

/// Load and parse a `.blunder` file.
pub fn load_blunder<P: AsRef<Path>>(path: P) -> ParseResult<SceneDescription> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    let description = parse_blunder(&content)?;

    log::info!(
        "Loaded {}: {} materials, {} spheres, {} triangles",
        path.display(),
        description.materials.len(),
        description.spheres.len(),
        description.triangles.len()
    );

    Ok(description)
}
