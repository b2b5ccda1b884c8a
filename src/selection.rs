use regex::Regex;

/// Grammar of a line-highlight fragment: one line number, or an inclusive
/// range written `low-high` (either order is accepted).
const LINE_FRAGMENT: &str = r"^#?(\d+)(?:-(\d+))?$";

/// An inclusive range of highlighted lines, `from <= to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighlightRange {
    pub from: usize,
    pub to: usize,
}

impl HighlightRange {
    pub fn contains(&self, line: usize) -> bool {
        (self.from..=self.to).contains(&line)
    }
}

/// Parse a fragment against the line grammar, swap-normalizing reversed
/// ranges. Anything that does not match yields `None`.
pub fn parse_fragment(fragment: &str) -> Option<HighlightRange> {
    let re = Regex::new(LINE_FRAGMENT).unwrap();
    let caps = re.captures(fragment)?;
    let from: usize = caps[1].parse().ok()?;
    let to: usize = match caps.get(2) {
        Some(m) => m.as_str().parse().ok()?,
        None => from,
    };
    if to < from {
        Some(HighlightRange { from: to, to: from })
    } else {
        Some(HighlightRange { from, to })
    }
}

/// Input channels of the line selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionEvent {
    /// A line-number element was clicked. Lines are 1-based.
    LineClicked { line: usize, shift: bool },
    /// The location fragment changed out-of-band (history navigation,
    /// address edits, initial load).
    FragmentChanged { fragment: String },
}

/// Side effects for the boundary layer, applied strictly in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionEffect {
    /// Rewrite the fragment of the current location in place. Never records
    /// a history entry, so back/forward do not accumulate one per click.
    ReplaceFragment(String),
    /// Bring a line into view.
    ScrollToLine(usize),
    /// Replace the highlight mark set wholesale.
    SetHighlight(HighlightRange),
    /// Put the viewport back where it was before this event.
    RestoreScroll,
}

/// The pending anchor for shift-click ranges. The rendered selection is
/// always re-derived from the fragment, never from this value.
#[derive(Debug, Default)]
pub struct SelectionState {
    anchor_line: Option<usize>,
}

impl SelectionState {
    /// Feed one event through the state machine. `line_count` is the number
    /// of lines the current page actually has.
    pub fn reduce(&mut self, event: SelectionEvent, line_count: usize) -> Vec<SelectionEffect> {
        match event {
            SelectionEvent::LineClicked { line, shift } => {
                if line == 0 {
                    return Vec::new();
                }
                match self.anchor_line {
                    Some(anchor) if shift => {
                        let (from, to) = if anchor > line { (line, anchor) } else { (anchor, line) };
                        // The anchor keeps pointing at the last plain-clicked
                        // line; a shift-click does not move it.
                        self.set_fragment(format!("{}-{}", from, to), line_count)
                    }
                    _ => {
                        self.anchor_line = Some(line);
                        self.set_fragment(line.to_string(), line_count)
                    }
                }
            }
            SelectionEvent::FragmentChanged { fragment } => highlight_effects(&fragment, line_count),
        }
    }

    /// Fragment update for a click: replace in place, re-derive the marks,
    /// then restore the viewport so the update itself never scrolls.
    fn set_fragment(&self, fragment: String, line_count: usize) -> Vec<SelectionEffect> {
        let mut effects = vec![SelectionEffect::ReplaceFragment(fragment.clone())];
        effects.extend(highlight_effects(&fragment, line_count));
        effects.push(SelectionEffect::RestoreScroll);
        effects
    }
}

/// Derive highlight effects from a fragment. A malformed fragment, or one
/// whose first line does not exist, leaves the current marks untouched; a
/// range running past the last line is clamped there.
fn highlight_effects(fragment: &str, line_count: usize) -> Vec<SelectionEffect> {
    let Some(range) = parse_fragment(fragment) else {
        return Vec::new();
    };
    if range.from == 0 || range.from > line_count {
        return Vec::new();
    }
    vec![
        SelectionEffect::ScrollToLine(range.from),
        SelectionEffect::SetHighlight(HighlightRange {
            from: range.from,
            to: range.to.min(line_count),
        }),
    ]
}
