//! Terminal and log-file event sinks.
//!
//! [`ConsoleSink`] prints human-readable lines (and the ASCII map on every
//! reporter tick). [`FileSink`] appends timestamped lines to three log files
//! in one directory:
//!
//! - `combat_log.txt`: battles
//! - `movement_log.txt`: moves
//! - `game_events.txt`: everything else

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use arena_core::entity::EntityView;
use arena_core::events::{EventSink, WorldSnapshot};
use arena_core::kind::Direction;
use arena_core::math::Bounds;

use crate::ascii_grid::{render_grid, render_stats, GridConfig};

/// Battle log file name.
pub const COMBAT_LOG_FILE: &str = "combat_log.txt";
/// Movement log file name.
pub const MOVEMENT_LOG_FILE: &str = "movement_log.txt";
/// General event log file name.
pub const EVENT_LOG_FILE: &str = "game_events.txt";
/// Timestamp prefix of every log line, e.g. `2024-05-01 13:37:00.123`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// What the console prints.
#[derive(Debug, Clone)]
pub struct ConsoleOptions {
    /// Print a line for every move.
    pub show_movement: bool,
    /// Print the map and statistics on every reporter tick.
    pub show_grid: bool,
    /// World bounds used to place entities on the map.
    pub bounds: Bounds,
    /// Map layout.
    pub grid: GridConfig,
}

impl Default for ConsoleOptions {
    fn default() -> Self {
        Self {
            show_movement: false,
            show_grid: true,
            bounds: Bounds::default(),
            grid: GridConfig::default(),
        }
    }
}

/// Prints events to a writer, stdout by default.
pub struct ConsoleSink<W = io::Stdout> {
    out: Mutex<W>,
    options: ConsoleOptions,
}

impl ConsoleSink<io::Stdout> {
    /// Console sink on stdout.
    #[must_use]
    pub fn stdout(options: ConsoleOptions) -> Self {
        Self::new(io::stdout(), options)
    }
}

impl<W: Write + Send> ConsoleSink<W> {
    /// Console sink on any writer.
    pub fn new(out: W, options: ConsoleOptions) -> Self {
        Self {
            out: Mutex::new(out),
            options,
        }
    }

    /// Consume the sink and return the writer.
    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    fn print(&self, text: &str) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        // Console write errors are ignored.
        let _ = out.write_all(text.as_bytes()).and_then(|()| out.flush());
    }
}

impl<W> std::fmt::Debug for ConsoleSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleSink")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<W: Write + Send> EventSink for ConsoleSink<W> {
    fn on_battle(&self, victor: &EntityView, defeated: &EntityView) {
        self.print(&format!(
            "[BATTLE] {} {} defeated {} {}\n",
            victor.kind.title(),
            victor.name,
            defeated.kind.title(),
            defeated.name
        ));
    }

    fn on_movement(&self, entity: &EntityView, direction: Direction) {
        if self.options.show_movement {
            self.print(&format!(
                "[MOVE] {} moved {} to ({:.0}, {:.0})\n",
                entity.name, direction, entity.position.x, entity.position.y
            ));
        }
    }

    fn on_event(&self, text: &str) {
        self.print(&format!("[EVENT] {text}\n"));
    }

    fn on_world_snapshot(&self, snapshot: &WorldSnapshot) {
        if self.options.show_grid {
            let mut text = String::from("\n");
            text.push_str(&render_grid(snapshot, &self.options.bounds, &self.options.grid));
            text.push_str(&render_stats(&snapshot.stats));
            self.print(&text);
        }
    }
}

/// Appends timestamped lines to the three log files.
#[derive(Debug)]
pub struct FileSink {
    dir: PathBuf,
    combat: Mutex<BufWriter<File>>,
    movement: Mutex<BufWriter<File>>,
    events: Mutex<BufWriter<File>>,
}

impl FileSink {
    /// Open (creating if needed) the log files inside `dir`, appending to
    /// any existing content.
    pub fn open<P: AsRef<Path>>(dir: P) -> io::Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let open = |name: &str| -> io::Result<Mutex<BufWriter<File>>> {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(dir.join(name))?;
            Ok(Mutex::new(BufWriter::new(file)))
        };
        Ok(Self {
            dir: dir.to_path_buf(),
            combat: open(COMBAT_LOG_FILE)?,
            movement: open(MOVEMENT_LOG_FILE)?,
            events: open(EVENT_LOG_FILE)?,
        })
    }

    /// Directory holding the log files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Flush all three files.
    pub fn flush(&self) -> io::Result<()> {
        for log in [&self.combat, &self.movement, &self.events] {
            log.lock().unwrap_or_else(PoisonError::into_inner).flush()?;
        }
        Ok(())
    }

    fn append(log: &Mutex<BufWriter<File>>, message: &str) {
        let mut writer = log.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(err) = writeln!(writer, "[{}] {message}", timestamp()) {
            tracing::warn!(%err, "failed to write log line");
        }
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        if let Err(err) = self.flush() {
            tracing::warn!(%err, "failed to flush log files");
        }
    }
}

impl EventSink for FileSink {
    fn on_battle(&self, victor: &EntityView, defeated: &EntityView) {
        Self::append(
            &self.combat,
            &format!(
                "{} ({}) defeated {} ({})",
                victor.name,
                victor.kind.token(),
                defeated.name,
                defeated.kind.token()
            ),
        );
    }

    fn on_movement(&self, entity: &EntityView, direction: Direction) {
        Self::append(
            &self.movement,
            &format!(
                "{} moved {} to ({:.1}, {:.1})",
                entity.name, direction, entity.position.x, entity.position.y
            ),
        );
    }

    fn on_event(&self, text: &str) {
        Self::append(&self.events, text);
    }

    fn on_world_snapshot(&self, snapshot: &WorldSnapshot) {
        Self::append(
            &self.events,
            &format!(
                "tick {}: {} of {} alive (knights {}, elves {}, dragons {})",
                snapshot.tick,
                snapshot.stats.alive,
                snapshot.stats.total,
                snapshot.stats.melee,
                snapshot.stats.ranged,
                snapshot.stats.apex
            ),
        );
    }
}

/// Local wall-clock time with millisecond precision.
fn timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use arena_core::kind::Kind;
    use arena_core::math::Position;
    use arena_core::registry::ArenaStats;

    use super::*;

    fn view(name: &str, kind: Kind) -> EntityView {
        EntityView {
            index: 0,
            kind,
            name: name.to_string(),
            position: Position::new(12.0, 34.0),
            alive: true,
        }
    }

    fn console(show_movement: bool) -> ConsoleSink<Vec<u8>> {
        ConsoleSink::new(
            Vec::new(),
            ConsoleOptions {
                show_movement,
                ..ConsoleOptions::default()
            },
        )
    }

    fn output(sink: ConsoleSink<Vec<u8>>) -> String {
        String::from_utf8(sink.into_inner()).unwrap()
    }

    #[test]
    fn test_console_battle_and_event() {
        let sink = console(false);
        sink.on_battle(&view("smaug", Kind::Apex), &view("arthur", Kind::Melee));
        sink.on_event("hello");
        let out = output(sink);
        assert!(out.contains("[BATTLE] Dragon smaug defeated Knight arthur"));
        assert!(out.contains("[EVENT] hello"));
    }

    #[test]
    fn test_console_movement_is_optional() {
        let quiet = console(false);
        quiet.on_movement(&view("e", Kind::Ranged), Direction::Up);
        assert!(output(quiet).is_empty());

        let loud = console(true);
        loud.on_movement(&view("e", Kind::Ranged), Direction::Up);
        assert_eq!(output(loud), "[MOVE] e moved up to (12, 34)\n");
    }

    #[test]
    fn test_console_snapshot_renders_grid_and_stats() {
        let sink = console(false);
        sink.on_world_snapshot(&WorldSnapshot {
            tick: 1,
            entities: vec![view("d", Kind::Apex)],
            stats: ArenaStats {
                total: 1,
                alive: 1,
                apex: 1,
                ..ArenaStats::default()
            },
        });
        let out = output(sink);
        assert!(out.contains("║D"));
        assert!(out.contains("ARENA STATISTICS"));
    }

    #[test]
    fn test_file_sink_routes_events() {
        let dir = tempfile::tempdir().unwrap();
        {
            let sink = FileSink::open(dir.path()).unwrap();
            sink.on_battle(&view("smaug", Kind::Apex), &view("arthur", Kind::Melee));
            sink.on_movement(&view("arthur", Kind::Melee), Direction::Left);
            sink.on_event("started");
        }
        let combat = fs::read_to_string(dir.path().join(COMBAT_LOG_FILE)).unwrap();
        let movement = fs::read_to_string(dir.path().join(MOVEMENT_LOG_FILE)).unwrap();
        let events = fs::read_to_string(dir.path().join(EVENT_LOG_FILE)).unwrap();
        assert!(combat.trim_end().ends_with("smaug (apex) defeated arthur (melee)"));
        let stamp = combat
            .strip_prefix('[')
            .and_then(|rest| rest.split_once(']'))
            .map(|(stamp, _)| stamp)
            .unwrap();
        assert!(chrono::NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).is_ok());
        assert!(movement.contains("arthur moved left to (12.0, 34.0)"));
        assert_eq!(events.lines().count(), 1);
    }

    #[test]
    fn test_file_sink_appends() {
        let dir = tempfile::tempdir().unwrap();
        for _ in 0..2 {
            let sink = FileSink::open(dir.path()).unwrap();
            sink.on_event("line");
        }
        let events = fs::read_to_string(dir.path().join(EVENT_LOG_FILE)).unwrap();
        assert_eq!(events.lines().count(), 2);
    }
}
