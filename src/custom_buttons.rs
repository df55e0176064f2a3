//! User-defined toolbar buttons read from the `.btn` definition file.
//!
//! Each non-comment line names a menu command by up to four menu labels and
//! gives the images for the button:
//!
//! ```text
//! Edit,Select All,,,standard.bmp,light.ico,dark.ico
//! Plugins,Compare,Settings...,,*G:S,*G:S
//! ```
//!
//! Image fields starting with `*` are quick codes describing a coloured
//! square with a short label; they are handed to the host's glyph generator.

use crate::identity::{CUSTOM_CMD_FIRST, CUSTOM_CMD_LIMIT};
use crate::menu::MenuPath;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const MAX_CUSTOM_BUTTONS: usize = (CUSTOM_CMD_LIMIT - CUSTOM_CMD_FIRST + 1) as usize;
/// Longest menu label or file name kept from a field.
pub const MAX_FIELD_CHARS: usize = 299;

pub const DEFAULT_TEMPLATE: &str = "\r\n\
;Custom button definitions, one per line:\r\n\
;menu1,menu2,menu3,menu4,bitmap,icon,dark icon\r\n\r\n\
;A button for the 'Select All' menu command using image files:\r\n\r\n\
;Edit,Select All,,,standard-1.bmp,fluentlight-1.ico,fluentdark-1.ico\r\n\r\n\
;or using quick codes:\r\n\r\n\
;Edit,Select All,,,*R:SA,*R:SA\r\n\r\n\
;A button for the Compare plugin 'Settings...' command:\r\n\r\n\
;Plugins,Compare,Settings...,,*G:S,*G:S\r\n\r\n\
;Replacing the Compare plugin 'Navigation Bar' button with a hex colour:\r\n\r\n\
;Plugins,Compare,Navigation Bar,,*#309030:NB,*#309030:NB\r\n\r\n\
;When the dark icon field is omitted the light icon is used.\r\n";

#[derive(Debug, Error)]
pub enum CustomButtonError {
    #[error("I/O error while {operation} at {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const SLATE: Rgb = Rgb::new(128, 128, 128);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn from_letter(letter: char) -> Self {
        match letter {
            'R' => Rgb::new(176, 48, 48),
            'G' => Rgb::new(48, 144, 48),
            'B' => Rgb::new(0, 80, 192),
            'C' => Rgb::new(0, 160, 160),
            'M' => Rgb::new(160, 64, 160),
            'Y' => Rgb::new(176, 144, 0),
            _ => Rgb::SLATE,
        }
    }

    /// Parse `#RRGGBB`; anything after the six digits is ignored.
    pub fn from_hex(text: &str) -> Option<Self> {
        let digits = text.strip_prefix('#')?;
        let digits: Vec<u8> = digits
            .chars()
            .take(6)
            .map(|c| c.to_digit(16).map(|d| d as u8))
            .collect::<Option<_>>()?;
        if digits.len() != 6 {
            return None;
        }
        Some(Rgb::new(
            digits[0] * 16 + digits[1],
            digits[2] * 16 + digits[3],
            digits[4] * 16 + digits[5],
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickCode {
    pub color: Rgb,
    /// At most two characters.
    pub label: String,
}

impl QuickCode {
    pub fn parse(field: &str) -> Option<Self> {
        let rest = field.strip_prefix('*')?;
        let chars: Vec<char> = rest.chars().collect();

        let (color, label): (Rgb, String) = match chars.as_slice() {
            [] => (Rgb::SLATE, String::new()),
            [':', tail @ ..] => (Rgb::SLATE, tail.iter().collect()),
            [letter] => (Rgb::from_letter(*letter), String::new()),
            [letter, ':', tail @ ..] => (Rgb::from_letter(*letter), tail.iter().collect()),
            _ => {
                let (code, label) = rest.split_once(':').unwrap_or((rest, ""));
                (Rgb::from_hex(code).unwrap_or(Rgb::SLATE), label.to_string())
            }
        };

        Some(Self {
            color,
            label: label.chars().take(2).collect(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ImageSource {
    #[default]
    Missing,
    File(String),
    Quick(QuickCode),
}

impl ImageSource {
    fn parse(field: &str) -> Self {
        if field.is_empty() {
            ImageSource::Missing
        } else if let Some(code) = QuickCode::parse(field) {
            ImageSource::Quick(code)
        } else {
            ImageSource::File(field.to_string())
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, ImageSource::Missing)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomButtonDef {
    pub menu_path: MenuPath,
    pub bitmap: ImageSource,
    pub icon: ImageSource,
    pub dark_icon: ImageSource,
}

impl CustomButtonDef {
    pub fn parse_line(line: &str) -> Option<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() || line.starts_with(';') {
            return None;
        }
        let mut fields = line
            .split(',')
            .map(|f| f.chars().take(MAX_FIELD_CHARS).collect::<String>());
        let mut next = || fields.next().unwrap_or_default();
        let menu_path = [next(), next(), next(), next()];
        let bitmap = ImageSource::parse(&next());
        let icon = ImageSource::parse(&next());
        let dark_icon = ImageSource::parse(&next());
        Some(Self {
            menu_path,
            bitmap,
            icon,
            dark_icon,
        })
    }

    /// Dark mode icon, falling back to the light one when not given.
    pub fn effective_dark_icon(&self) -> &ImageSource {
        if self.dark_icon.is_missing() {
            &self.icon
        } else {
            &self.dark_icon
        }
    }

    pub fn describe(&self) -> String {
        self.menu_path.join(",")
    }
}

/// Placeholder command id for the definition at `index` until its menu path
/// is resolved.
pub fn temporary_command(index: usize) -> u32 {
    CUSTOM_CMD_FIRST + index as u32
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomButtons {
    pub definitions: Vec<CustomButtonDef>,
    /// Definitions dropped because the limit was reached.
    pub skipped: usize,
}

impl CustomButtons {
    pub fn parse(text: &str) -> Self {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut out = CustomButtons::default();
        for def in text.lines().filter_map(CustomButtonDef::parse_line) {
            if out.definitions.len() < MAX_CUSTOM_BUTTONS {
                out.definitions.push(def);
            } else {
                out.skipped += 1;
            }
        }
        if out.skipped > 0 {
            tracing::warn!(
                skipped = out.skipped,
                "more than {MAX_CUSTOM_BUTTONS} custom buttons defined"
            );
        }
        out
    }

    /// Pair each definition's temporary id with the real command its menu
    /// path points at. Unmatched definitions keep their temporary id.
    pub fn resolve_commands<F>(&self, lookup: F) -> Vec<(u32, u32)>
    where
        F: Fn(&MenuPath) -> Option<u32>,
    {
        self.definitions
            .iter()
            .enumerate()
            .filter_map(|(index, def)| match lookup(&def.menu_path) {
                Some(command) => Some((temporary_command(index), command)),
                None => {
                    tracing::warn!(path = %def.describe(), "custom button menu path not found");
                    None
                }
            })
            .collect()
    }

    pub fn definition_for(&self, command: u32) -> Option<&CustomButtonDef> {
        let index = command.checked_sub(CUSTOM_CMD_FIRST)? as usize;
        self.definitions.get(index)
    }
}

/// Decode the definition file. UTF-16LE (the host's native encoding) is
/// recognised by its byte order mark or by a zero high byte on the first
/// character; anything else is read as UTF-8.
pub fn decode_text(bytes: &[u8]) -> String {
    let utf16 = match bytes {
        [0xff, 0xfe, rest @ ..] => Some(rest),
        [_, 0, ..] if bytes.len() % 2 == 0 => Some(bytes),
        _ => None,
    };
    match utf16 {
        Some(body) => {
            let units: Vec<u16> = body
                .chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        None => {
            let body = bytes.strip_prefix(&[0xef, 0xbb, 0xbf]).unwrap_or(bytes);
            String::from_utf8_lossy(body).into_owned()
        }
    }
}

fn encode_utf16le(text: &str) -> Vec<u8> {
    let mut out = vec![0xff, 0xfe];
    for unit in text.encode_utf16() {
        out.extend_from_slice(&unit.to_le_bytes());
    }
    out
}

/// Read definitions from `path`. A missing file means no custom buttons.
pub fn load(path: &Path) -> Result<CustomButtons, CustomButtonError> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(CustomButtons::parse(&decode_text(&bytes))),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(CustomButtons::default()),
        Err(source) => Err(CustomButtonError::Io {
            operation: "reading custom buttons",
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Write the commented example file unless one exists. Returns whether a
/// file was created.
pub fn ensure_template(path: &Path) -> Result<bool, CustomButtonError> {
    if path.exists() {
        return Ok(false);
    }
    let io_err = |source| CustomButtonError::Io {
        operation: "writing custom button template",
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    std::fs::write(path, encode_utf16le(DEFAULT_TEMPLATE)).map_err(io_err)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quick_code_with_letter_colour() {
        assert_eq!(
            QuickCode::parse("*R:SA"),
            Some(QuickCode {
                color: Rgb::new(176, 48, 48),
                label: "SA".into()
            })
        );
    }

    #[test]
    fn quick_code_with_hex_colour() {
        assert_eq!(
            QuickCode::parse("*#309030:NB"),
            Some(QuickCode {
                color: Rgb::new(0x30, 0x90, 0x30),
                label: "NB".into()
            })
        );
    }

    #[test]
    fn quick_code_fallbacks() {
        let grey = |label: &str| QuickCode {
            color: Rgb::SLATE,
            label: label.into(),
        };
        assert_eq!(QuickCode::parse("*:AB"), Some(grey("AB")));
        assert_eq!(QuickCode::parse("*"), Some(grey("")));
        assert_eq!(QuickCode::parse("*Q:X"), Some(grey("X")));
        assert_eq!(QuickCode::parse("*#12zz00:X"), Some(grey("X")));
        assert_eq!(QuickCode::parse("*S:LONG"), Some(grey("LO")));
        assert_eq!(QuickCode::parse("plain.ico"), None);
    }

    #[test]
    fn definition_line_pads_missing_fields() {
        let def = CustomButtonDef::parse_line("Edit,Select All,,,*R:SA,*R:SA").expect("def");
        assert_eq!(def.menu_path, ["Edit", "Select All", "", ""].map(String::from));
        assert!(matches!(def.bitmap, ImageSource::Quick(_)));
        assert!(def.dark_icon.is_missing());
        assert_eq!(def.effective_dark_icon(), &def.icon);

        let bare = CustomButtonDef::parse_line("Edit,Copy").expect("def");
        assert!(bare.bitmap.is_missing());
        assert!(bare.icon.is_missing());
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        assert!(CustomButtonDef::parse_line(";Edit,Select All").is_none());
        assert!(CustomButtonDef::parse_line("\r").is_none());
        let parsed = CustomButtons::parse(DEFAULT_TEMPLATE);
        assert!(parsed.definitions.is_empty());
    }

    #[test]
    fn file_names_are_kept_verbatim() {
        let def =
            CustomButtonDef::parse_line("Plugins,Compare,Settings...,,a.bmp,b.ico,c.ico\r")
                .expect("def");
        assert_eq!(def.bitmap, ImageSource::File("a.bmp".into()));
        assert_eq!(def.dark_icon, ImageSource::File("c.ico".into()));
    }

    #[test]
    fn definitions_beyond_the_limit_are_counted() {
        let text: String = (0..MAX_CUSTOM_BUTTONS + 3)
            .map(|i| format!("Edit,Item {i},,\r\n"))
            .collect();
        let parsed = CustomButtons::parse(&text);
        assert_eq!(parsed.definitions.len(), MAX_CUSTOM_BUTTONS);
        assert_eq!(parsed.skipped, 3);
    }

    #[test]
    fn resolves_only_matching_paths() {
        let parsed = CustomButtons::parse("Edit,Select All\nEdit,Missing\n");
        let pairs = parsed.resolve_commands(|path| (path[1] == "Select All").then_some(42007));
        assert_eq!(pairs, vec![(temporary_command(0), 42007)]);
        assert_eq!(
            parsed.definition_for(temporary_command(1)).map(|d| d.describe()),
            Some("Edit,Missing,,".to_string())
        );
        assert!(parsed.definition_for(100).is_none());
    }

    #[test]
    fn decodes_utf16_and_utf8_files() {
        let utf16 = encode_utf16le("Edit,Cut\r\n");
        assert_eq!(decode_text(&utf16), "Edit,Cut\r\n");

        let no_bom: Vec<u8> = "Edit".encode_utf16().flat_map(|u| u.to_le_bytes()).collect();
        assert_eq!(decode_text(&no_bom), "Edit");

        let mut utf8 = vec![0xef, 0xbb, 0xbf];
        utf8.extend_from_slice("Édit,Cut".as_bytes());
        assert_eq!(decode_text(&utf8), "Édit,Cut");
    }

    #[test]
    fn template_is_written_once_and_loads_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("CustomizeToolbar.btn");
        assert!(load(&path).expect("missing").definitions.is_empty());

        assert!(ensure_template(&path).expect("create"));
        assert!(!ensure_template(&path).expect("exists"));
        let parsed = load(&path).expect("load");
        assert!(parsed.definitions.is_empty());
        assert_eq!(parsed.skipped, 0);
    }
}
