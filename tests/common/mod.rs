// tests/common/mod.rs
#![allow(dead_code)]

use std::path::PathBuf;
use vcrack_core::persistence::load_word_list;
use vcrack_core::Dictionary;

pub const DICKENS: &str = "It was the best of times and it was the worst of times, it was the age \
    of wisdom and it was the age of foolishness, it was the epoch of belief and it was the \
    epoch of incredulity, it was the season of light and it was the season of darkness, it \
    was the spring of hope and it was the winter of despair, we had everything before us and \
    we had nothing before us, we were all going direct to heaven and we were all going direct \
    the other way. In short the period was so far like the present period that some of its \
    noisiest authorities insisted on its being received for good or for evil in the superlative \
    degree of comparison only. There were a king with a large jaw and a queen \
    with a plain face on the throne of England.";

pub const VILLAGE: &str = "The village stood at the edge of a wide valley where the river turned slowly towards the \
    sea. In the early morning the fishermen carried their nets down to the water while the \
    bakers lit their ovens and the smell of fresh bread drifted along the narrow streets. Most \
    of the houses were built from grey stone taken from the hills, and each one had a small \
    garden where the families grew beans, onions and potatoes for the long winter months. The \
    children walked to school in groups, talking about the games they would play in the \
    afternoon and the stories their grandparents had told them the night before. \
    Every spring a market came to the square in front of the old church. Traders arrived from \
    distant towns with cloth, tools, spices and animals, and for three days the whole valley \
    seemed to gather in one place. People bought and sold, argued over prices, shared news about \
    marriages and quarrels, and listened to musicians who played until the lamps burned low. The \
    mayor always gave a short speech about the harvest and the weather, and nobody ever \
    remembered a single word of it, but everyone agreed that the market would not be the same \
    without it. \
    One year a stranger appeared at the market with a cart full of books. He was a tall man with \
    a quiet voice and a coat that had seen better days. He did not shout like the other traders. \
    Instead he sat beside his cart and read aloud from whatever book was nearest to his hand, \
    and slowly a crowd of children and then their parents gathered to listen. By the end of the \
    third day he had sold almost nothing, yet he seemed perfectly content. When the mayor asked \
    him why he had come so far to sell so little, he answered that he had not come to sell at \
    all, but to find out whether anyone in the valley still wanted to read. \
    The question troubled the mayor more than he expected. That winter he spoke with the \
    schoolmaster, the priest and the owner of the inn, and together they decided to open a small \
    library in an empty room above the post office. They asked every family to give one book, \
    and to their surprise the shelves were full within a month. Farmers who had not opened a \
    book since childhood began to borrow stories of sailors and soldiers, and old women who had \
    never learned their letters asked the schoolmaster for lessons in the evenings. When the stranger \
    returned the following spring he found the room crowded with readers, and for once he was \
    the one who listened while others read aloud to him.";

pub fn data_path(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("data");
    path.push(name);
    path
}

/// The bundled word list followed by every word of `texts`, so the plaintexts
/// used in tests are fully recognizable.
pub fn dictionary_for(texts: &[&str]) -> Dictionary {
    let mut words = load_word_list(&data_path("Words.json")).unwrap();
    for text in texts {
        words.extend(
            text.split(|c: char| !c.is_ascii_alphabetic())
                .filter(|w| !w.is_empty())
                .map(str::to_string),
        );
    }
    Dictionary::from_ranked_words(words)
}

/// `count` letters of `text` starting at letter number `start`, punctuation included.
pub fn letter_window(text: &str, start: usize, count: usize) -> &str {
    let letters: Vec<usize> = text
        .char_indices()
        .filter(|(_, c)| c.is_ascii_alphabetic())
        .map(|(i, _)| i)
        .collect();
    let from = letters[start];
    let to = letters.get(start + count).copied().unwrap_or(text.len());
    &text[from..to]
}
