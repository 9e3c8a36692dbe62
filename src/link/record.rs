//! Directory record metadata.
//!
//! Server names in the directory look like `vultr-la:teams:`: a company,
//! a dash, a location, then a mode code closed by a trailing `:`. The
//! opening `:` before the mode code is optional and the mode code itself
//! may contain `:`, so the close is always the last one in the string.

use std::fmt;

use crate::common::error::RecordError;

/// Game mode of a server, translated from its mode code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Ffa,
    TwoTeams,
    FourTeams,
    Domination,
    Maze,
    Sandbox,
}

impl Mode {
    /// Translate a mode code. Unknown codes are free-for-all.
    pub fn from_code(code: &str) -> Self {
        match code {
            "teams" => Self::TwoTeams,
            "4teams" => Self::FourTeams,
            "dom" => Self::Domination,
            "maze" => Self::Maze,
            "sandbox" => Self::Sandbox,
            _ => Self::Ffa,
        }
    }

    /// Human-readable mode name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ffa => "FFA",
            Self::TwoTeams => "2-TDM",
            Self::FourTeams => "4-TDM",
            Self::Domination => "Domination",
            Self::Maze => "Maze",
            Self::Sandbox => "Sandbox",
        }
    }

    /// Embed colour for this mode.
    pub fn colour(&self) -> u32 {
        match self {
            Self::Ffa => 0x00B2E1,
            Self::TwoTeams => 0xF14E54,
            Self::FourTeams => 0xBE7FF5,
            Self::Domination => 0xFFE869,
            Self::Maze => 0x00E16E,
            Self::Sandbox => 0x999999,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fields parsed out of a raw server name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerName {
    /// Company, title-cased.
    pub company: String,
    pub location: String,
    /// The untranslated mode code.
    pub mode_code: String,
    pub mode: Mode,
}

/// Parse a raw server name.
///
/// Fails when the name does not follow the grammar. The mode code
/// fallback to FFA only applies once the grammar has matched.
pub fn parse_name(raw: &str) -> Result<ServerName, RecordError> {
    let grammar = || RecordError::Grammar {
        raw: raw.to_string(),
    };

    let (company, rest) = take_lowercase(raw);
    if company.is_empty() {
        return Err(grammar());
    }
    let rest = rest.strip_prefix('-').ok_or_else(grammar)?;

    let (location, rest) = take_lowercase(rest);
    if location.is_empty() {
        return Err(grammar());
    }

    let mode_code = trailing_field(rest).ok_or_else(grammar)?;

    Ok(ServerName {
        company: title_case(company),
        location: location.to_string(),
        mode_code: mode_code.to_string(),
        mode: Mode::from_code(mode_code),
    })
}

/// Split off the leading run of lowercase ASCII letters.
fn take_lowercase(input: &str) -> (&str, &str) {
    let end = input
        .find(|c: char| !c.is_ascii_lowercase())
        .unwrap_or(input.len());
    input.split_at(end)
}

/// Match `:?<field>:` where `<field>` runs to the last `:`.
///
/// The opening `:` is consumed only if another `:` follows it;
/// otherwise it is the closing separator and the field is empty.
fn trailing_field(rest: &str) -> Option<&str> {
    if let Some(after) = rest.strip_prefix(':') {
        if let Some(end) = after.rfind(':') {
            return Some(&after[..end]);
        }
    }
    rest.rfind(':').map(|end| &rest[..end])
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// One server listed in the directory.
///
/// Metadata is parsed when the record is built, so a record that exists
/// always has valid fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryRecord {
    address: String,
    raw_name: String,
    name: ServerName,
}

impl DirectoryRecord {
    /// Build a record from its two directory fields.
    pub fn new(
        address: impl Into<String>,
        raw_name: impl Into<String>,
    ) -> Result<Self, RecordError> {
        let address = address.into();
        let raw_name = raw_name.into();

        if split_address(&address).0.is_empty() {
            return Err(RecordError::Address { raw: address });
        }
        let name = parse_name(&raw_name)?;

        Ok(Self {
            address,
            raw_name,
            name,
        })
    }

    /// The raw `ip:port` field.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Host part of the address, used as the lookup key.
    pub fn ip(&self) -> &str {
        split_address(&self.address).0
    }

    pub fn port(&self) -> Option<&str> {
        split_address(&self.address).1
    }

    pub fn raw_name(&self) -> &str {
        &self.raw_name
    }

    pub fn company(&self) -> &str {
        &self.name.company
    }

    pub fn location(&self) -> &str {
        &self.name.location
    }

    pub fn mode(&self) -> Mode {
        self.name.mode
    }

    pub fn mode_code(&self) -> &str {
        &self.name.mode_code
    }
}

fn split_address(address: &str) -> (&str, Option<&str>) {
    match address.rsplit_once(':') {
        Some((ip, port)) => (ip, Some(port)),
        None => (address, None),
    }
}
