//! ASCII arena map and statistics table for terminal review.
//!
//! The world is squeezed onto a fixed character grid (50×20 by default).
//! Row 0 is the world's minimum Y. Positions on the maximum edge fall into
//! the last row/column rather than off the grid.

use std::fmt::Write as _;

use arena_core::entity::EntityView;
use arena_core::events::WorldSnapshot;
use arena_core::kind::Kind;
use arena_core::math::Bounds;
use arena_core::registry::ArenaStats;

/// ASCII rendering configuration.
#[derive(Debug, Clone)]
pub struct GridConfig {
    /// Columns in the map.
    pub width: usize,
    /// Rows in the map.
    pub height: usize,
    /// Print the symbol legend under the map.
    pub show_legend: bool,
    /// Use colored output (ANSI).
    pub use_color: bool,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: 50,
            height: 20,
            show_legend: true,
            use_color: false,
        }
    }
}

/// ANSI color codes.
mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";

    pub const BLUE: &str = "\x1b[34m";
    pub const GREEN: &str = "\x1b[32m";
    pub const RED: &str = "\x1b[31m";
}

fn kind_color(kind: Kind) -> &'static str {
    match kind {
        Kind::Melee => colors::BLUE,
        Kind::Ranged => colors::GREEN,
        Kind::Apex => colors::RED,
    }
}

/// Grid cell `(column, row)` for a position, or `None` if it lies outside
/// `bounds`.
#[must_use]
pub fn cell_for(
    x: f64,
    y: f64,
    bounds: &Bounds,
    width: usize,
    height: usize,
) -> Option<(usize, usize)> {
    if !bounds.contains(x, y) || width == 0 || height == 0 {
        return None;
    }
    let scale = |value: f64, min: f64, span: f64, cells: usize| {
        let fraction = if span > 0.0 { (value - min) / span } else { 0.0 };
        // fraction is in [0, 1]; truncation picks the cell.
        let cell = (fraction * cells as f64) as usize;
        cell.min(cells - 1)
    };
    Some((
        scale(x, bounds.min_x, bounds.width(), width),
        scale(y, bounds.min_y, bounds.height(), height),
    ))
}

/// Render the living entities of `snapshot` as a bordered map.
#[must_use]
pub fn render_grid(snapshot: &WorldSnapshot, bounds: &Bounds, config: &GridConfig) -> String {
    let mut grid: Vec<Vec<Option<Kind>>> = vec![vec![None; config.width]; config.height];
    for entity in snapshot.living() {
        if let Some((col, row)) = cell_for(
            entity.position.x,
            entity.position.y,
            bounds,
            config.width,
            config.height,
        ) {
            grid[row][col] = Some(entity.kind);
        }
    }

    let mut output = String::new();
    let _ = writeln!(
        output,
        "{}╔══ Tick {} │ Alive {}/{} ══╗{}",
        if config.use_color { colors::BOLD } else { "" },
        snapshot.tick,
        snapshot.stats.alive,
        snapshot.stats.total,
        if config.use_color { colors::RESET } else { "" }
    );
    let rule = "═".repeat(config.width);
    let _ = writeln!(output, "╔{rule}╗");
    for row in &grid {
        output.push('║');
        for cell in row {
            match cell {
                Some(kind) if config.use_color => {
                    output.push_str(kind_color(*kind));
                    output.push(kind.symbol());
                    output.push_str(colors::RESET);
                }
                Some(kind) => output.push(kind.symbol()),
                None => output.push('.'),
            }
        }
        output.push_str("║\n");
    }
    let _ = writeln!(output, "╚{rule}╝");

    if config.show_legend {
        let legend: Vec<String> = Kind::ALL
            .iter()
            .map(|kind| format!("{}={}", kind.symbol(), kind.title()))
            .chain(std::iter::once(".=empty".to_string()))
            .collect();
        let _ = writeln!(output, "{}", legend.join("  "));
    }
    output
}

/// Render the statistics table.
#[must_use]
pub fn render_stats(stats: &ArenaStats) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "┌───────────── ARENA STATISTICS ─────────────┐");
    let _ = writeln!(
        output,
        "│ Creatures: {:>4} │ Alive: {:>4} │ Dead: {:>4}  │",
        stats.total,
        stats.alive,
        stats.dead()
    );
    let _ = writeln!(
        output,
        "│ Knights: {:>4} │ Elves: {:>4} │ Dragons: {:>4} │",
        stats.melee, stats.ranged, stats.apex
    );
    let _ = writeln!(output, "└────────────────────────────────────────────┘");
    output
}

/// Render one line per living entity: kind, name and position.
#[must_use]
pub fn render_survivors<'a, I>(entities: I) -> String
where
    I: IntoIterator<Item = &'a EntityView>,
{
    let mut output = String::new();
    for entity in entities.into_iter().filter(|e| e.alive) {
        let _ = writeln!(
            output,
            "  {:<7} {:<16} ({:.0}, {:.0})",
            entity.kind.title(),
            entity.name,
            entity.position.x,
            entity.position.y
        );
    }
    if output.is_empty() {
        output.push_str("  (none)\n");
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_core::math::Position;

    fn view(index: usize, kind: Kind, x: f64, y: f64, alive: bool) -> EntityView {
        EntityView {
            index,
            kind,
            name: format!("n{index}"),
            position: Position::new(x, y),
            alive,
        }
    }

    fn snapshot(entities: Vec<EntityView>) -> WorldSnapshot {
        WorldSnapshot {
            tick: 3,
            entities,
            stats: ArenaStats::default(),
        }
    }

    #[test]
    fn test_cell_mapping() {
        let bounds = Bounds::default();
        assert_eq!(cell_for(0.0, 0.0, &bounds, 50, 20), Some((0, 0)));
        assert_eq!(cell_for(1000.0, 1000.0, &bounds, 50, 20), Some((49, 19)));
        assert_eq!(cell_for(500.0, 500.0, &bounds, 50, 20), Some((25, 10)));
        assert_eq!(cell_for(-1.0, 0.0, &bounds, 50, 20), None);
    }

    #[test]
    fn test_render_empty_grid() {
        let out = render_grid(&snapshot(vec![]), &Bounds::default(), &GridConfig::default());
        assert!(out.contains("Tick 3"));
        let rows: Vec<&str> = out.lines().filter(|l| l.starts_with('║')).collect();
        assert_eq!(rows.len(), 20);
        assert!(rows.iter().all(|r| r.chars().filter(|c| *c == '.').count() == 50));
        assert!(out.contains("K=Knight"));
    }

    #[test]
    fn test_render_places_living_only() {
        let out = render_grid(
            &snapshot(vec![
                view(0, Kind::Apex, 0.0, 0.0, true),
                view(1, Kind::Ranged, 999.0, 999.0, true),
                view(2, Kind::Melee, 500.0, 500.0, false),
            ]),
            &Bounds::default(),
            &GridConfig {
                show_legend: false,
                ..GridConfig::default()
            },
        );
        let rows: Vec<&str> = out.lines().filter(|l| l.starts_with('║')).collect();
        assert!(rows[0].starts_with("║D"));
        assert!(rows[19].ends_with("E║"));
        assert!(!out.contains('K'));
    }

    #[test]
    fn test_stats_table() {
        let stats = ArenaStats {
            total: 50,
            alive: 12,
            melee: 4,
            ranged: 5,
            apex: 3,
        };
        let out = render_stats(&stats);
        assert!(out.contains("Creatures:   50"));
        assert!(out.contains("Dead:   38"));
        assert!(out.contains("Dragons:    3"));
    }

    #[test]
    fn test_survivors_listing() {
        let entities = [
            view(0, Kind::Melee, 1.0, 2.0, true),
            view(1, Kind::Apex, 3.0, 4.0, false),
        ];
        let out = render_survivors(&entities);
        assert!(out.contains("Knight"));
        assert!(out.contains("n0"));
        assert!(!out.contains("n1"));
        assert_eq!(render_survivors(std::iter::empty()), "  (none)\n");
    }
}
