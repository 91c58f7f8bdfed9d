use std::collections::{BTreeMap, HashSet};

use crossfill::pattern::Pattern;
use crossfill::progress::NoProgress;
use crossfill::{
    extract_slots, find_fill, generate_grid_config, generate_grid_config_from_template, number_grid, Direction,
    FillError, FillFailure, FillOptions, FillSuccess, Grid, GridConfig, Lexicon, OrderStrategy, SlotStrategy,
};

/// Check everything a finished fill has to satisfy: every slot holds a distinct lexicon word, and
/// crossing slots read the same letter at their shared cell.
fn assert_valid_fill(config: &GridConfig, success: &FillSuccess) {
    assert!(success.grid.is_complete(), "grid has blanks:\n{}", success.grid);

    let mut seen = HashSet::new();
    for slot in &config.slots {
        let word = Pattern::from_slot(slot, &success.grid).to_word().unwrap();
        let is_seed = config.seed_slot_ids.contains(&slot.id);
        assert!(is_seed || config.lexicon.contains(&word), "{word} at {} is not in the lexicon", slot.label());
        assert!(seen.insert(word.clone()), "{word} appears more than once");

        for (cell_idx, crossing) in slot.crossing_cells() {
            let other = &config.slots[crossing.other_slot_id];
            assert_eq!(
                success.grid.letter(slot.cells[cell_idx]),
                success.grid.letter(other.cells[crossing.other_slot_cell]),
            );
        }
    }

    assert_eq!(success.choices.len(), config.slots.len());
}

fn blocks(grid: &Grid) -> Vec<bool> {
    (0..grid.height())
        .flat_map(|row| (0..grid.width()).map(move |col| (row, col)))
        .map(|coord| !grid.is_open(coord))
        .collect()
}

#[test]
fn test_scenario_a_too_few_distinct_words() {
    // Four slots need four distinct words, and there are only three.
    let lexicon = Lexicon::from_words(["AT", "IT", "AI"]);
    let config = generate_grid_config_from_template("..\n..", &lexicon).unwrap();

    let result = find_fill(&config, &FillOptions::default(), &mut NoProgress);
    assert!(matches!(result, Err(FillFailure::Exhausted)));
}

#[test]
fn test_scenario_a_consistent_square() {
    let lexicon = Lexicon::from_words(["AT", "IT", "AI", "TO", "TI", "OT", "IO"]);
    let config = generate_grid_config_from_template("..\n..", &lexicon).unwrap();

    let success = find_fill(&config, &FillOptions::default(), &mut NoProgress).unwrap();
    assert_valid_fill(&config, &success);
}

#[test]
fn test_scenario_b_hello_horse() {
    let lexicon = Lexicon::from_words(["HELLO", "HORSE"]);
    let config = generate_grid_config_from_template(
        "
        .....
        .####
        .####
        .####
        .####
        ",
        &lexicon,
    )
    .unwrap();

    let success = find_fill(&config, &FillOptions::default(), &mut NoProgress).unwrap();
    assert_valid_fill(&config, &success);
    assert_eq!(success.entries(), vec![(1, Direction::Across, "HELLO"), (1, Direction::Down, "HORSE")]);
    assert_eq!(success.grid.render(), "HELLO\nO####\nR####\nS####\nE####");
}

#[test]
fn test_scenario_c_no_shared_first_letter() {
    let lexicon = Lexicon::from_words(["HELLO", "WORLD"]);
    let template = "
        .....
        .####
        .####
        .####
        .####
        ";
    let config = generate_grid_config_from_template(template, &lexicon).unwrap();

    let result = find_fill(&config, &FillOptions::default(), &mut NoProgress);
    assert!(matches!(result, Err(FillFailure::Exhausted)));

    // The config's grid is never touched by the search.
    assert_eq!(config.grid, Grid::from_template(template).unwrap());
}

#[test]
fn test_scenario_d_missing_length_rejected_up_front() {
    let lexicon = Lexicon::from_words(["AB", "CD", "ABC"]);
    let err = generate_grid_config_from_template("....\n..##", &lexicon).unwrap_err();

    match &err {
        FillError::LexiconCoverage { lengths } => assert_eq!(lengths, &vec![4]),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.code(), "F006");
}

#[test]
fn test_word_square_with_distractors() {
    let lexicon = Lexicon::from_words([
        "BAT", "ORE", "WED", "BOW", "ARE", "TED", "CAT", "CAR", "TOE", "ATE", "EAT", "TAR", "ORB", "OWE",
    ]);
    let config = generate_grid_config_from_template("...\n...\n...", &lexicon).unwrap();

    for slot_strategy in [SlotStrategy::FewestCandidates, SlotStrategy::InputOrder, SlotStrategy::Lookahead] {
        for order_strategy in [OrderStrategy::Alphabetical, OrderStrategy::Lookahead] {
            let options = FillOptions { slot_strategy, order_strategy, ..FillOptions::default() };
            let success = find_fill(&config, &options, &mut NoProgress).unwrap();

            assert_valid_fill(&config, &success);
            assert_eq!(blocks(&success.grid), blocks(&config.grid));
        }
    }
}

#[test]
fn test_prefilled_letters_are_respected() {
    let lexicon = Lexicon::from_words([
        "BAT", "ORE", "WED", "BOW", "ARE", "TED", "CAT", "CAR", "TOE", "ATE", "EAT", "TAR", "ORB", "OWE",
    ]);
    let config = generate_grid_config_from_template("..T\n...\nW..", &lexicon).unwrap();

    let success = find_fill(&config, &FillOptions::default(), &mut NoProgress).unwrap();
    assert_valid_fill(&config, &success);
    assert_eq!(success.grid.letter((0, 2)), Some('T'));
    assert_eq!(success.grid.letter((2, 0)), Some('W'));
}

#[test]
fn test_fill_is_deterministic() {
    let lexicon = Lexicon::from_words([
        "BAT", "ORE", "WED", "BOW", "ARE", "TED", "CAT", "CAR", "TOE", "ATE", "EAT", "TAR", "ORB", "OWE",
    ]);
    let config = generate_grid_config_from_template("...\n...\n...", &lexicon).unwrap();

    let first = find_fill(&config, &FillOptions::default(), &mut NoProgress).unwrap();
    for _ in 0..3 {
        let again = find_fill(&config, &FillOptions::default(), &mut NoProgress).unwrap();
        assert_eq!(again.grid, first.grid);
        assert_eq!(again.choices, first.choices);
        assert_eq!(again.statistics.states, first.statistics.states);
    }
}

#[test]
fn test_extraction_is_idempotent() {
    let grid = Grid::from_template(
        "
        ...#.
        .....
        #...#
        .....
        .#...
        ",
    )
    .unwrap();
    let numbering = number_grid(&grid);

    let first = extract_slots(&grid, &numbering).unwrap();
    let second = extract_slots(&grid, &numbering).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_caller_supplied_numbering() {
    let grid = Grid::from_template("..\n..").unwrap();
    let numbering: BTreeMap<(usize, usize), u32> = [((0, 0), 7), ((0, 1), 8), ((1, 0), 9)].into_iter().collect();

    let lexicon = Lexicon::from_words(["AB", "CD", "AC", "BD"]);
    let config = generate_grid_config(grid, &numbering, &lexicon).unwrap();
    let success = find_fill(&config, &FillOptions::default(), &mut NoProgress).unwrap();

    assert_eq!(
        success.entries(),
        vec![
            (7, Direction::Across, "AB"),
            (7, Direction::Down, "AC"),
            (8, Direction::Down, "BD"),
            (9, Direction::Across, "CD"),
        ]
    );
}

#[test]
fn test_numbering_on_a_block_is_rejected() {
    let grid = Grid::from_template(".#\n..").unwrap();
    let numbering: BTreeMap<(usize, usize), u32> = [((0, 1), 1)].into_iter().collect();
    let lexicon = Lexicon::from_words(["AB"]);

    let err = generate_grid_config(grid, &numbering, &lexicon).unwrap_err();
    assert!(matches!(err, FillError::InvalidNumbering { number: 1, row: 0, col: 1, .. }));
}

#[test]
fn test_partial_numbering_is_rejected() {
    // Only 1-across and 1-down are numbered; 2-down and 3-across would never be filled.
    let grid = Grid::from_template("..\n..").unwrap();
    let numbering: BTreeMap<(usize, usize), u32> = [((0, 0), 1)].into_iter().collect();
    let lexicon = Lexicon::from_words(["AB", "CD", "AC", "BD"]);

    let err = generate_grid_config(grid, &numbering, &lexicon).unwrap_err();
    assert!(matches!(err, FillError::UnnumberedRunStart { row: 0, col: 1 }));
    assert_eq!(err.code(), "F008");
}

#[test]
fn test_repeated_prefilled_entries_are_rejected() {
    let lexicon = Lexicon::from_words(["AB", "XY"]);
    let err = generate_grid_config_from_template("AB\n##\nAB", &lexicon).unwrap_err();
    assert!(matches!(err, FillError::DuplicateEntry { .. }));
}

#[test]
fn test_dictionary_fixture() {
    let contents = "
        bat;60
        ore;55
        wed;50
        bow;70
        are;65
        ted;40
        zzz;5
        cat,60
        bare
        ";
    let lexicon = Lexicon::parse_from_str(contents, 30);

    assert!(lexicon.contains("BAT"));
    assert!(lexicon.contains("BARE"));
    assert!(!lexicon.contains("ZZZ"));

    let config = generate_grid_config_from_template("...\n.#.\n...", &lexicon).unwrap();
    let success = find_fill(&config, &FillOptions::default(), &mut NoProgress).unwrap();
    assert_valid_fill(&config, &success);
}

#[test]
fn test_lexicon_loaded_from_source() {
    let source = vec!["hello", "horse", "hi", "a", "worlds"];
    let lexicon = Lexicon::load(&source, [5]);

    assert_eq!(lexicon.len(), 2);
    assert!(lexicon.contains("HELLO"));
    assert!(!lexicon.contains("HI"));
}

#[test]
fn test_progress_snapshots_show_partial_grids() {
    let lexicon = Lexicon::from_words(["HELLO", "HORSE"]);
    let config = generate_grid_config_from_template(".....\n.####\n.####\n.####\n.####", &lexicon).unwrap();
    let mut snapshots: Vec<String> = vec![];

    let success = find_fill(&config, &FillOptions::default(), &mut |snapshot: &str| {
        snapshots.push(snapshot.to_string())
    })
    .unwrap();

    assert_eq!(snapshots.len() as u64, success.statistics.states);
    assert_eq!(snapshots[0], ".....\n.####\n.####\n.####\n.####");
    assert_eq!(snapshots[1], "HELLO\n.####\n.####\n.####\n.####");
}
