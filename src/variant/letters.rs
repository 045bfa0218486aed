//! Letter draws for the letter rules

use itertools::Itertools;

use crate::constants::letters::{ALPHABET, MAX_BANNED_LETTERS, MIN_BANNED_LETTERS, VOWELS};

fn is_vowel(letter: char) -> bool {
    VOWELS.contains(letter)
}

/// Draws the banned letters of a game or round
///
/// Between two and four letters are drawn without replacement. Once a vowel
/// is drawn the remaining vowels leave the pool, so at most one vowel is
/// ever banned. `exclude` keeps a letter out of the pool entirely. The
/// result is sorted.
pub fn draw_banned_letters(rng: &mut fastrand::Rng, exclude: Option<char>) -> Vec<char> {
    let count = rng.usize(MIN_BANNED_LETTERS..=MAX_BANNED_LETTERS);
    let mut pool = ALPHABET
        .chars()
        .filter(|&c| Some(c) != exclude)
        .collect_vec();

    let mut banned = Vec::with_capacity(count);
    while banned.len() < count && !pool.is_empty() {
        let letter = pool.swap_remove(rng.usize(..pool.len()));
        if is_vowel(letter) {
            pool.retain(|&c| !is_vowel(c));
        }
        banned.push(letter);
    }

    banned.sort_unstable();
    banned
}

/// Draws a required letter other than `exclude`
pub fn draw_required_letter(rng: &mut fastrand::Rng, exclude: Option<char>) -> char {
    let pool = ALPHABET
        .chars()
        .filter(|&c| Some(c) != exclude)
        .collect_vec();
    pool[rng.usize(..pool.len())]
}
