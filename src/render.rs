//! Turning an assignment back into a picture of the grid.

use crate::backtracking_search::Assignment;
use crate::grid_config::GridConfig;
use crate::word_list::WordList;

/// Drawn for cells that can't hold a letter.
pub const BLOCK: char = '█';

/// The letter in each cell, indexed `[row][column]`. Blocked cells and open cells that no assigned
/// slot covers are `None`.
pub fn letter_grid(
    config: &GridConfig,
    words: &WordList,
    assignment: &Assignment,
) -> Vec<Vec<Option<char>>> {
    let structure = config.structure();
    let mut letters = vec![vec![None; structure.width()]; structure.height()];

    for (slot_id, word_id) in assignment.iter() {
        let slot = config.slot(slot_id);
        for (cell_idx, &letter) in words.get(word_id).letters.iter().enumerate().take(slot.length) {
            let (row, column) = slot.cell(cell_idx);
            letters[row][column] = Some(letter);
        }
    }

    letters
}

/// Turn the given grid config and assignment into a rendered string, one line per row.
pub fn render_grid(config: &GridConfig, words: &WordList, assignment: &Assignment) -> String {
    let structure = config.structure();

    letter_grid(config, words, assignment)
        .iter()
        .enumerate()
        .map(|(row, letters)| {
            letters
                .iter()
                .enumerate()
                .map(|(column, letter)| match letter {
                    _ if !structure.is_open((row, column)) => BLOCK,
                    Some(letter) => *letter,
                    None => ' ',
                })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backtracking_search::{find_fill, FillOptions};
    use crate::grid_config::Structure;

    fn structure_0() -> GridConfig {
        GridConfig::from_structure(
            Structure::parse(
                "
                #___#
                #_##_
                #_##_
                #_##_
                #____
                ",
            )
            .unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_render_filled_grid() {
        let config = structure_0();
        let words = WordList::new([
            "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
        ])
        .unwrap();

        let assignment = find_fill(&config, &words, FillOptions::default())
            .unwrap()
            .assignment
            .expect("Failed to find a fill");

        insta::assert_snapshot!(render_grid(&config, &words, &assignment), @r"
        █SIX█
        █E██F
        █V██I
        █E██V
        █NINE
        ");
    }

    #[test]
    fn test_render_partial_grid() {
        let config = structure_0();
        let words = WordList::new(["six", "five"]).unwrap();
        let mut assignment = Assignment::new(config.slot_count());
        assignment.assign(0, words.id_of("six").unwrap());
        assignment.assign(2, words.id_of("five").unwrap());

        let letters = letter_grid(&config, &words, &assignment);
        assert_eq!(letters[0][1], Some('S'));
        assert_eq!(letters[4][4], Some('E'));
        assert_eq!(letters[4][1], None);
        assert_eq!(letters[0][0], None);

        assert_eq!(
            render_grid(&config, &words, &assignment),
            ["█SIX█", "█ ██F", "█ ██I", "█ ██V", "█   E"].join("\n"),
        );
    }
}
