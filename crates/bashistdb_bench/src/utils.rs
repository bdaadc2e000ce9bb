//! Benchmark utilities.

use bashistdb_testkit::HistoryBuilder;
use rand::seq::SliceRandom;
use rand::Rng;

const VOCABULARY: &[&str] = &[
    "ls -la",
    "cd ..",
    "git status",
    "git diff --stat",
    "cargo build --release",
    "vim src/main.rs",
    "make -j8",
    "ssh build01",
    "htop",
    "grep -rn TODO .",
];

/// Random payload bytes.
pub fn random_data(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen()).collect()
}

/// `history` output of `lines` commands drawn from a small vocabulary, so
/// frequency queries have something to group.
pub fn history_text(lines: usize) -> String {
    let mut rng = rand::thread_rng();
    let mut builder = HistoryBuilder::new();
    for _ in 0..lines {
        let command = VOCABULARY.choose(&mut rng).copied().unwrap_or("true");
        builder = builder.command(command);
    }
    builder.build()
}
