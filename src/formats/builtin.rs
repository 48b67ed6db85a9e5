use crate::models::{DebateFormat, SegmentDefinition};

/// Formats that ship with the timer. The first entry is the fallback default.
pub fn builtin_formats() -> Vec<DebateFormat> {
    vec![
        DebateFormat {
            name: "Lincoln-Douglas".into(),
            description: "Traditional LD format with 6-3-7-3-4-6-3".into(),
            affirmative: vec![
                SegmentDefinition::new("aff-constructive", "Affirmative Constructive", 360, false),
                SegmentDefinition::new("aff-rebuttal", "Affirmative Rebuttal", 180, false),
                SegmentDefinition::new("aff-summary", "Affirmative Summary", 240, false),
            ],
            negative: vec![
                SegmentDefinition::new("neg-constructive", "Negative Constructive", 420, false),
                SegmentDefinition::new("neg-rebuttal", "Negative Rebuttal", 180, false),
                SegmentDefinition::new("neg-summary", "Negative Summary", 240, false),
            ],
        },
        DebateFormat {
            name: "Public Forum".into(),
            description: "Traditional PF format with 4-4-4-4-2-2-2-2".into(),
            affirmative: vec![
                SegmentDefinition::new("aff-speaker1", "First Affirmative Speaker", 240, false),
                SegmentDefinition::new("aff-speaker2", "Second Affirmative Speaker", 240, false),
                SegmentDefinition::new("aff-rebuttal1", "First Affirmative Rebuttal", 120, false),
                SegmentDefinition::new("aff-rebuttal2", "Second Affirmative Rebuttal", 120, false),
            ],
            negative: vec![
                SegmentDefinition::new("neg-speaker1", "First Negative Speaker", 240, false),
                SegmentDefinition::new("neg-speaker2", "Second Negative Speaker", 240, false),
                SegmentDefinition::new("neg-rebuttal1", "First Negative Rebuttal", 120, false),
                SegmentDefinition::new("neg-rebuttal2", "Second Negative Rebuttal", 120, false),
            ],
        },
        DebateFormat {
            name: "Quick Test".into(),
            description: "Short timers for testing (10-30s each)".into(),
            affirmative: vec![
                SegmentDefinition::new("aff-test1", "Aff Test 1", 30, false),
                SegmentDefinition::new("aff-test2", "Aff Test 2", 10, false),
                SegmentDefinition::new("aff-test3", "Aff Test 3", 30, false),
            ],
            negative: vec![
                SegmentDefinition::new("neg-test1", "Neg Test 1", 30, false),
                SegmentDefinition::new("neg-test2", "Neg Test 2", 10, false),
                SegmentDefinition::new("neg-test3", "Neg Test 3", 30, false),
            ],
        },
    ]
}
