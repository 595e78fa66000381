use serde::Deserialize;

pub const ANIMATE_CLASS: &str = "animate-on-scroll";
pub const VISIBLE_CLASS: &str = "visible";

const HIDDEN_OPACITY: &str = "0";
const HIDDEN_TRANSFORM: &str = "translateY(20px)";
const SHOWN_OPACITY: &str = "1";
const SHOWN_TRANSFORM: &str = "translateY(0)";
const FADE_TRANSITION: &str = "opacity 0.6s ease-out, transform 0.6s ease-out";

/// How a section is switched between hidden and revealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RevealPolicy {
    /// Toggle marker classes and let the stylesheet own the transition.
    #[default]
    ClassToggle,
    /// Write opacity/transform/transition straight onto the element.
    InlineStyle,
}

/// A single DOM mutation the host has to perform on a section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevealEffect {
    AddClass(&'static str),
    SetStyle(&'static str, &'static str),
}

impl RevealPolicy {
    /// Mutations that put a freshly observed section into its hidden state.
    pub fn prepare_effects(self) -> Vec<RevealEffect> {
        match self {
            RevealPolicy::ClassToggle => vec![RevealEffect::AddClass(ANIMATE_CLASS)],
            RevealPolicy::InlineStyle => vec![
                RevealEffect::SetStyle("opacity", HIDDEN_OPACITY),
                RevealEffect::SetStyle("transform", HIDDEN_TRANSFORM),
                RevealEffect::SetStyle("transition", FADE_TRANSITION),
            ],
        }
    }

    pub fn reveal_effects(self) -> Vec<RevealEffect> {
        match self {
            RevealPolicy::ClassToggle => vec![RevealEffect::AddClass(VISIBLE_CLASS)],
            RevealPolicy::InlineStyle => vec![
                RevealEffect::SetStyle("opacity", SHOWN_OPACITY),
                RevealEffect::SetStyle("transform", SHOWN_TRANSFORM),
            ],
        }
    }
}

/// One entry delivered by the viewport observer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntersectionSample {
    pub index: usize,
    pub ratio: f64,
    pub is_intersecting: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SectionState {
    pub revealed: bool,
}

impl SectionState {
    /// Revealed is terminal; nothing a later sample says can undo it.
    pub fn on_intersection(self, sample: &IntersectionSample, threshold: f64) -> SectionState {
        if self.revealed {
            return self;
        }
        SectionState {
            revealed: sample.is_intersecting && sample.ratio >= threshold,
        }
    }
}

/// Reveal state for every section found when the page booted.
#[derive(Debug, Clone)]
pub struct ScrollReveal {
    sections: Vec<SectionState>,
    threshold: f64,
    policy: RevealPolicy,
}

impl ScrollReveal {
    pub fn new(section_count: usize, threshold: f64, policy: RevealPolicy) -> Self {
        Self {
            sections: vec![SectionState::default(); section_count],
            threshold,
            policy,
        }
    }

    pub fn policy(&self) -> RevealPolicy {
        self.policy
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn is_revealed(&self, index: usize) -> bool {
        self.sections.get(index).is_some_and(|s| s.revealed)
    }

    pub fn revealed_count(&self) -> usize {
        self.sections.iter().filter(|s| s.revealed).count()
    }

    /// Feeds a batch of observer entries and returns the indices that became
    /// revealed by it, in entry order. Unknown indices are ignored.
    pub fn observe(&mut self, samples: &[IntersectionSample]) -> Vec<usize> {
        let mut newly_revealed = Vec::new();
        for sample in samples {
            let Some(section) = self.sections.get_mut(sample.index) else {
                continue;
            };
            let next = section.on_intersection(sample, self.threshold);
            if next.revealed && !section.revealed {
                newly_revealed.push(sample.index);
            }
            *section = next;
        }
        newly_revealed
    }
}
