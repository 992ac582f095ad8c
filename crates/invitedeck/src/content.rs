use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

const BUILTIN: &str = include_str!("../assets/content.yaml");

/// The two languages the invitation is written in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "ld")]
    LisanUdDawat,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Self::English => "en",
            Self::LisanUdDawat => "ld",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "en" => Some(Self::English),
            "ld" => Some(Self::LisanUdDawat),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::English => Self::LisanUdDawat,
            Self::LisanUdDawat => Self::English,
        }
    }

    pub fn is_rtl(self) -> bool {
        matches!(self, Self::LisanUdDawat)
    }

    /// Name shown on the viewer's language toggle. Latin script only, since the
    /// window chrome has no Arabic-script font.
    pub fn label(self) -> &'static str {
        match self {
            Self::English => "English",
            Self::LisanUdDawat => "Lisan ud-Dawat",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// One entry of the event schedule. All fields are display strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub loc: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub time: String,
}

/// Text shared by both languages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Common {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bismillah: Option<String>,
}

/// Everything the slides show for one language.
///
/// Every field is optional or defaulted: a content file with missing keys still
/// loads, and the layouts simply leave the corresponding block out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invite_line: Option<String>,

    #[serde(default)]
    pub groom_name: String,

    #[serde(default)]
    pub bride_name: String,

    #[serde(default = "default_connector")]
    pub connector: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bride_parents_line: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spiritual_body: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nikah_loc: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events_title: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<Event>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compliments_title: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub family_list: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_label: Option<String>,
}

fn default_connector() -> String {
    "&".to_string()
}

impl Default for Content {
    fn default() -> Self {
        Self {
            invite_line: None,
            groom_name: String::new(),
            bride_name: String::new(),
            connector: default_connector(),
            bride_parents_line: None,
            spiritual_body: None,
            nikah_loc: None,
            events_title: None,
            events: Vec::new(),
            compliments_title: None,
            family_list: Vec::new(),
            download_label: None,
        }
    }
}

/// Static bilingual content, loaded once at startup and never mutated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentTable {
    #[serde(default)]
    pub common: Common,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub en: Option<Content>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ld: Option<Content>,
}

impl ContentTable {
    /// The invitation text compiled into the binary.
    pub fn builtin() -> Self {
        // The embedded asset is covered by tests; an unreadable table degrades to empty slides.
        Self::parse(BUILTIN).unwrap_or_default()
    }

    pub fn parse(yaml: &str) -> Result<Self> {
        let table: ContentTable =
            serde_yaml::from_str(yaml).context("Failed to parse content table")?;
        Ok(table)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read content file {}", path.display()))?;
        Self::parse(&yaml)
    }

    /// Use the file at `path` when given, the built-in table otherwise.
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load_from(p),
            None => Ok(Self::builtin()),
        }
    }

    pub fn get(&self, language: Language) -> Option<&Content> {
        match language {
            Language::English => self.en.as_ref(),
            Language::LisanUdDawat => self.ld.as_ref(),
        }
    }
}
