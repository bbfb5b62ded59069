//! Scenario files.
//!
//! A scenario is a plain text file with one entity per line:
//!
//! ```text
//! # kind   name     x      y      state
//! apex     smaug    500.0  500.0  alive
//! melee    arthur   10.0   20.0   alive
//! ranged   legolas  5.0    5.0    dead
//! ```
//!
//! Fields are whitespace separated. Kind tokens are those accepted by
//! [`Kind`]'s parser (`melee`/`knight`, `ranged`/`elf`, `apex`/`dragon`). The
//! state column is optional and defaults to `alive`. Blank lines and lines
//! starting with `#` are ignored. [`save`] writes living entities only, in
//! exactly the format [`load`] reads back.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use arena_core::entity::EntityView;
use arena_core::error::ArenaError;
use arena_core::kind::Kind;
use arena_core::registry::EntityRegistry;
use thiserror::Error;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// Failed to read or write the file.
    #[error("Failed to access scenario file: {0}")]
    Io(#[from] std::io::Error),
    /// A line is malformed.
    #[error("Line {line}: {message}")]
    Parse {
        /// 1-based line number.
        line: usize,
        /// What is wrong with it.
        message: String,
    },
    /// A well-formed line was rejected by the registry.
    #[error("Line {line}: {source}")]
    Spawn {
        /// 1-based line number.
        line: usize,
        /// Registry error.
        #[source]
        source: ArenaError,
    },
}

/// One parsed scenario line.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioEntry {
    /// Entity kind.
    pub kind: Kind,
    /// Entity name.
    pub name: String,
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
    /// Whether the entity starts alive.
    pub alive: bool,
}

impl ScenarioEntry {
    /// Format as one scenario line (without newline).
    #[must_use]
    pub fn to_line(&self) -> String {
        format!(
            "{} {} {} {} {}",
            self.kind.token(),
            self.name,
            self.x,
            self.y,
            if self.alive { "alive" } else { "dead" }
        )
    }
}

impl From<&EntityView> for ScenarioEntry {
    fn from(view: &EntityView) -> Self {
        Self {
            kind: view.kind,
            name: view.name.clone(),
            x: view.position.x,
            y: view.position.y,
            alive: view.alive,
        }
    }
}

/// Parse one line. `Ok(None)` for blank and comment lines.
pub fn parse_line(line_no: usize, line: &str) -> Result<Option<ScenarioEntry>, ScenarioError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let parse_err = |message: String| ScenarioError::Parse {
        line: line_no,
        message,
    };

    let fields: Vec<&str> = line.split_whitespace().collect();
    if !(4..=5).contains(&fields.len()) {
        return Err(parse_err(format!(
            "expected `<kind> <name> <x> <y> [alive|dead]`, found {} fields",
            fields.len()
        )));
    }
    let kind: Kind = fields[0]
        .parse()
        .map_err(|err: ArenaError| parse_err(err.to_string()))?;
    let coordinate = |field: &str, axis: &str| {
        field
            .parse::<f64>()
            .map_err(|_| parse_err(format!("invalid {axis} coordinate {field:?}")))
    };
    let x = coordinate(fields[2], "x")?;
    let y = coordinate(fields[3], "y")?;
    let alive = match fields.get(4).map(|s| s.to_ascii_lowercase()) {
        None => true,
        Some(state) if state == "alive" => true,
        Some(state) if state == "dead" => false,
        Some(state) => return Err(parse_err(format!("invalid state {state:?}"))),
    };
    Ok(Some(ScenarioEntry {
        kind,
        name: fields[1].to_string(),
        x,
        y,
        alive,
    }))
}

/// Parse a whole scenario text.
pub fn parse_str(text: &str) -> Result<Vec<ScenarioEntry>, ScenarioError> {
    let mut entries = Vec::new();
    for (i, line) in text.lines().enumerate() {
        if let Some(entry) = parse_line(i + 1, line)? {
            entries.push(entry);
        }
    }
    Ok(entries)
}

/// Render living entities in scenario format.
#[must_use]
pub fn render<'a, I>(entities: I) -> String
where
    I: IntoIterator<Item = &'a EntityView>,
{
    let mut out = String::from("# kind name x y state\n");
    for view in entities.into_iter().filter(|v| v.alive) {
        let _ = writeln!(out, "{}", ScenarioEntry::from(view).to_line());
    }
    out
}

/// Write the registry's living entities to `path`. Returns how many were
/// written.
pub fn save<P: AsRef<Path>>(registry: &EntityRegistry, path: P) -> Result<usize, ScenarioError> {
    let snapshot = registry.snapshot();
    let count = snapshot.iter().filter(|v| v.alive).count();
    fs::write(path.as_ref(), render(&snapshot))?;
    tracing::info!(path = %path.as_ref().display(), count, "scenario saved");
    Ok(count)
}

/// Spawn every entry of the scenario at `path` into `registry`. Dead
/// entries are added already dead so indices match the file.
///
/// Every line is parsed and validated against the world before anything is
/// added, so any error leaves the registry untouched. Returns how many
/// entries were loaded.
pub fn load<P: AsRef<Path>>(registry: &EntityRegistry, path: P) -> Result<usize, ScenarioError> {
    let text = fs::read_to_string(path.as_ref())?;
    let count = load_str(registry, &text)?;
    tracing::info!(path = %path.as_ref().display(), count, "scenario loaded");
    Ok(count)
}

/// Like [`load`], from text.
pub fn load_str(registry: &EntityRegistry, text: &str) -> Result<usize, ScenarioError> {
    let creation = *registry.read().creation();
    let mut entities = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let Some(entry) = parse_line(i + 1, line)? else {
            continue;
        };
        let mut entity = creation
            .create(entry.kind, entry.x, entry.y, &entry.name)
            .map_err(|source| ScenarioError::Spawn { line: i + 1, source })?;
        if !entry.alive {
            entity.mark_dead();
        }
        entities.push(entity);
    }
    Ok(registry.insert_all(entities).len())
}
