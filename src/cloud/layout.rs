use std::sync::atomic::{AtomicU64, Ordering};

use super::{
    seed::{content_seed, Mulberry32},
    Word,
};

/// Smallest font size a word can be assigned.
const MIN_SIZE: f32 = 12.0;
/// The largest word never exceeds this fraction of the shorter canvas dimension.
const MAX_SIZE_RATIO: f32 = 0.30;
/// Exponent applied to the normalized value. >1 compresses small values and
/// expands large ones, so dominant activities visibly dominate.
const SIZE_EXPONENT: f32 = 1.8;
/// Clearance around a word as a fraction of its own font size.
const PADDING_RATIO: f32 = 0.15;
/// Below this many words the effective canvas shrinks so the cloud stays dense.
const SPARSE_WORD_LIMIT: usize = 4;
const SPARSE_SHRINK: f32 = 0.8;
/// Spiral search bound per word; words that still collide get dropped.
const MAX_PLACEMENT_STEPS: u32 = 4000;

/// Approximate glyph width/height as a fraction of font size, horizontal text only.
const GLYPH_WIDTH_RATIO: f32 = 0.58;
const LINE_HEIGHT_RATIO: f32 = 1.15;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Canvas {
    pub width: f32,
    pub height: f32,
}

impl Canvas {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    fn shorter(&self) -> f32 {
        self.width.min(self.height)
    }
}

/// One laid-out word: top-left anchored bounding box plus the assigned size.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedWord {
    pub text: String,
    pub value: u32,
    pub size: f32,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PlacedWord {
    fn padding(&self) -> f32 {
        self.size * PADDING_RATIO
    }

    pub fn contains(&self, px: f32, py: f32) -> bool {
        self.x <= px && px < self.x + self.width && self.y <= py && py < self.y + self.height
    }
}

/// Padded-box intersection test. Each word contributes its own clearance, so
/// larger words keep proportionally more air around them.
fn overlaps(a: &PlacedWord, b: &PlacedWord) -> bool {
    let gap = a.padding() + b.padding();
    a.x < b.x + b.width + gap
        && b.x < a.x + a.width + gap
        && a.y < b.y + b.height + gap
        && b.y < a.y + a.height + gap
}

/// Deterministic word-cloud layout. The same set of `{text, value}` pairs, in
/// any order, produces byte-identical output: the seed comes from the content
/// and placement iterates words in a fixed (descending value) order.
///
/// Entries with an empty text or a zero value are dropped. Words for which the
/// spiral search finds no free spot inside the canvas are omitted rather than
/// allowed to overlap.
pub fn layout(words: &[Word], canvas: Canvas) -> Vec<PlacedWord> {
    let mut words: Vec<&Word> = words
        .iter()
        .filter(|w| !w.text.trim().is_empty() && w.value > 0)
        .collect();
    if words.is_empty() {
        return Vec::new();
    }

    // Dominant words go first, which both improves packing and fixes the
    // placement order independently of the caller's array order.
    words.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.text.cmp(&b.text)));

    let owned: Vec<Word> = words.iter().map(|w| (*w).clone()).collect();
    let mut rng = Mulberry32::new(content_seed(&owned));

    let effective = if words.len() < SPARSE_WORD_LIMIT {
        Canvas::new(canvas.width * SPARSE_SHRINK, canvas.height * SPARSE_SHRINK)
    } else {
        canvas
    };

    let min_value = words.iter().map(|w| w.value).min().unwrap_or(0);
    let max_value = words.iter().map(|w| w.value).max().unwrap_or(0);
    let max_size = (effective.shorter() * MAX_SIZE_RATIO).max(MIN_SIZE);

    let mut placed = Vec::<PlacedWord>::with_capacity(words.len());
    for word in &words {
        let size = font_size(word.value, min_value, max_value, max_size);
        let width = word.text.chars().count() as f32 * size * GLYPH_WIDTH_RATIO;
        let height = size * LINE_HEIGHT_RATIO;

        let candidate = PlacedWord {
            text: word.text.clone(),
            value: word.value,
            size,
            x: 0.0,
            y: 0.0,
            width,
            height,
        };
        if let Some(found) = place_on_spiral(candidate, effective, &placed, &mut rng) {
            placed.push(found);
        }
    }

    placed
}

/// Nonlinear value→size mapping: normalize into `[0, 1]`, raise to
/// [SIZE_EXPONENT], scale into `[MIN_SIZE, max_size]`.
fn font_size(value: u32, min_value: u32, max_value: u32, max_size: f32) -> f32 {
    let span = (max_value.saturating_sub(min_value)).max(1) as f32;
    let normalized = (value.saturating_sub(min_value)) as f32 / span;
    MIN_SIZE + normalized.powf(SIZE_EXPONENT) * (max_size - MIN_SIZE)
}

/// Walks an archimedean spiral out from the canvas center until the word's
/// padded box neither leaves the canvas nor intersects an already placed box.
fn place_on_spiral(
    mut word: PlacedWord,
    canvas: Canvas,
    placed: &[PlacedWord],
    rng: &mut Mulberry32,
) -> Option<PlacedWord> {
    let center_x = canvas.width / 2.0;
    let center_y = canvas.height / 2.0;
    // Per-word start angle comes from the seeded generator, so it is part of
    // the deterministic pipeline rather than a source of jitter.
    let start_angle = rng.next_f32() * std::f32::consts::TAU;
    let radius_step = canvas.shorter() / (MAX_PLACEMENT_STEPS as f32);
    let angle_step = 0.35;

    for step in 0..MAX_PLACEMENT_STEPS {
        let radius = radius_step * step as f32;
        let angle = start_angle + angle_step * step as f32;
        let cx = center_x + radius * angle.cos();
        let cy = center_y + radius * angle.sin();
        word.x = cx - word.width / 2.0;
        word.y = cy - word.height / 2.0;

        if !fits_canvas(&word, canvas) {
            continue;
        }
        if placed.iter().all(|other| !overlaps(&word, other)) {
            return Some(word);
        }
    }
    None
}

fn fits_canvas(word: &PlacedWord, canvas: Canvas) -> bool {
    word.x >= 0.0
        && word.y >= 0.0
        && word.x + word.width <= canvas.width
        && word.y + word.height <= canvas.height
}

/// Reverse-maps a pointer coordinate to the word whose box contains it. Boxes
/// never overlap by construction, so the answer is unambiguous.
pub fn hit_test(placed: &[PlacedWord], x: f32, y: f32) -> Option<&PlacedWord> {
    placed.iter().find(|w| w.contains(x, y))
}

/// Supersede-on-restart guard for layout requests. Rapid state changes can kick
/// off a new layout while an older one is still unfinished; only the result
/// carrying the newest ticket survives the commit.
#[derive(Default)]
pub struct LayoutGate {
    issued: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutTicket {
    id: u64,
}

impl LayoutGate {
    pub fn begin(&self) -> LayoutTicket {
        LayoutTicket {
            id: self.issued.fetch_add(1, Ordering::SeqCst) + 1,
        }
    }

    /// Returns the result only when no newer request has begun since `ticket`
    /// was issued; stale results are discarded.
    pub fn commit<T>(&self, ticket: LayoutTicket, result: T) -> Option<T> {
        if ticket.id == self.issued.load(Ordering::SeqCst) {
            Some(result)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_words() -> Vec<Word> {
        vec![
            Word::new("running", 120),
            Word::new("reading", 45),
            Word::new("cooking", 30),
            Word::new("piano", 75),
            Word::new("chess", 15),
            Word::new("writing", 60),
        ]
    }

    fn canvas() -> Canvas {
        Canvas::new(800.0, 400.0)
    }

    #[test]
    fn identical_input_lays_out_identically() {
        let a = layout(&sample_words(), canvas());
        let b = layout(&sample_words(), canvas());

        assert_eq!(a, b);
    }

    #[test]
    fn input_order_does_not_matter() {
        let mut reversed = sample_words();
        reversed.reverse();

        assert_eq!(layout(&sample_words(), canvas()), layout(&reversed, canvas()));
    }

    #[test]
    fn no_pair_of_padded_boxes_intersects() {
        let placed = layout(&sample_words(), canvas());

        assert!(!placed.is_empty());
        for (i, a) in placed.iter().enumerate() {
            for b in &placed[i + 1..] {
                assert!(!overlaps(a, b), "{} overlaps {}", a.text, b.text);
            }
        }
    }

    #[test]
    fn invalid_entries_are_dropped() {
        let words = vec![
            Word::new("running", 30),
            Word::new("", 50),
            Word::new("   ", 50),
            Word::new("idle", 0),
        ];

        let placed = layout(&words, canvas());

        assert_eq!(placed.len(), 1);
        assert_eq!(placed[0].text, "running");
    }

    #[test]
    fn larger_values_get_larger_sizes() {
        let placed = layout(&sample_words(), canvas());

        let by_name = |name: &str| placed.iter().find(|w| w.text == name).unwrap();
        assert!(by_name("running").size > by_name("piano").size);
        assert!(by_name("piano").size > by_name("chess").size);
    }

    #[test]
    fn largest_word_respects_the_canvas_cap() {
        let placed = layout(&sample_words(), canvas());
        let cap = canvas().shorter() * MAX_SIZE_RATIO;

        for word in &placed {
            assert!(word.size <= cap + f32::EPSILON);
        }
    }

    #[test]
    fn sparse_clouds_shrink_but_still_place() {
        let words = vec![Word::new("running", 30), Word::new("reading", 10)];

        let placed = layout(&words, canvas());

        assert_eq!(placed.len(), 2);
        let shrunk = Canvas::new(canvas().width * SPARSE_SHRINK, canvas().height * SPARSE_SHRINK);
        for word in &placed {
            assert!(fits_canvas(word, shrunk));
        }
    }

    #[test]
    fn changing_one_value_keeps_the_layout_valid() {
        let mut words = sample_words();
        words[1].value += 200;

        let placed = layout(&words, canvas());

        for (i, a) in placed.iter().enumerate() {
            for b in &placed[i + 1..] {
                assert!(!overlaps(a, b));
            }
        }
    }

    #[test]
    fn hit_testing_is_unambiguous() {
        let placed = layout(&sample_words(), canvas());

        for word in &placed {
            let cx = word.x + word.width / 2.0;
            let cy = word.y + word.height / 2.0;
            let hit = hit_test(&placed, cx, cy).unwrap();
            assert_eq!(hit.text, word.text);
        }
        assert!(hit_test(&placed, -1.0, -1.0).is_none());
    }

    #[test]
    fn stale_layout_results_are_discarded() {
        let gate = LayoutGate::default();

        let old = gate.begin();
        let new = gate.begin();

        assert_eq!(gate.commit(old, "old"), None);
        assert_eq!(gate.commit(new, "new"), Some("new"));
    }
}
