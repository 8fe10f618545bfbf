use std::fmt;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::vector::VectorLayer;

const GEOMETRY_WIDTH: usize = 48;

/// Table rendering settings of a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayOptions {
    /// Longer layers show as many rows split between head and tail.
    pub max_rows: usize,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self { max_rows: 4 }
    }
}

pub struct LayerDisplay<'a> {
    layer: &'a VectorLayer,
    options: DisplayOptions,
}

impl<'a> LayerDisplay<'a> {
    pub(crate) fn new(layer: &'a VectorLayer, options: DisplayOptions) -> Self {
        Self { layer, options }
    }

    /// Positions to print, `None` marking the elided middle.
    fn positions(&self) -> Vec<Option<usize>> {
        let len = self.layer.len();
        let max_rows = self.options.max_rows;
        if len <= max_rows {
            return (0..len).map(Some).collect();
        }
        let tail = max_rows / 2;
        let head = max_rows - tail;
        (0..head)
            .map(Some)
            .chain(std::iter::once(None))
            .chain((len - tail..len).map(Some))
            .collect()
    }
}

fn truncate(text: String, width: usize) -> String {
    if text.chars().count() <= width {
        return text;
    }
    let kept: String = text.chars().take(width - 3).collect();
    format!("{kept}...")
}

impl fmt::Display for LayerDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let layer = self.layer;
        let header: Vec<String> = std::iter::once(String::new())
            .chain(layer.columns().into_iter().map(String::from))
            .collect();
        let positions = self.positions();
        let cells: Vec<Vec<String>> = positions
            .iter()
            .map(|position| match position {
                Some(i) => std::iter::once(layer.labels()[*i].to_string())
                    .chain(layer.rows[*i].iter().map(ToString::to_string))
                    .chain(std::iter::once(truncate(
                        layer.geometry()[*i].to_wkt(),
                        GEOMETRY_WIDTH,
                    )))
                    .collect(),
                None => vec!["...".to_string(); header.len()],
            })
            .collect();
        let widths: Vec<usize> = (0..header.len())
            .map(|column| {
                std::iter::once(&header)
                    .chain(cells.iter())
                    .map(|row| row[column].chars().count())
                    .max()
                    .unwrap_or(0)
            })
            .collect();
        let render = |row: &Vec<String>| {
            row.iter()
                .zip(&widths)
                .map(|(cell, width)| format!("{cell:<width$}"))
                .join("  ")
                .trim_end()
                .to_string()
        };
        write!(f, "{}", render(&header))?;
        for row in &cells {
            write!(f, "\n{}", render(row))?;
        }
        if positions.contains(&None) {
            write!(
                f,
                "\n\n[{} rows x {} columns]",
                layer.len(),
                layer.columns().len()
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::tests::world;
    use rstest::rstest;

    #[rstest]
    fn long_layers_are_elided(world: VectorLayer) {
        let text = world.select(&["name_long"]).unwrap().to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 8);
        assert!(lines[0].trim_start().starts_with("name_long"));
        assert!(lines[1].starts_with("0 "));
        assert!(lines[3].starts_with("..."));
        assert!(lines[5].starts_with("4 "));
        assert_eq!(lines[7], "[5 rows x 2 columns]");
    }

    #[rstest]
    fn short_layers_print_whole(world: VectorLayer) {
        let egypt = world.filter_eq("name_long", "Egypt").unwrap();
        let text = egypt.display(DisplayOptions { max_rows: 4 }).to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("2 "));
        assert!(lines[1].contains("Egypt"));
        assert!(lines[1].contains("POLYGON"));
    }

    #[test]
    fn truncation_marks_cut_text() {
        assert_eq!(truncate("POINT (1 2)".into(), 20), "POINT (1 2)");
        assert_eq!(truncate("abcdefghij".into(), 6), "abc...");
    }
}
