//! Derivation planning: which renditions a source photo gets.
//!
//! Every photo gets `small` and `large`. The album cover additionally gets
//! `medium`, which the album index uses as its header image. The rule only
//! looks at the file name, so each file is planned independently of the rest
//! of the album.

use crate::config::RenditionsConfig;
use crate::imaging::Quality;
use crate::naming;
use crate::types::Label;
use std::path::Path;

/// One rendition to produce for a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenditionSpec {
    pub label: Label,
    pub width: u32,
    pub quality: Quality,
}

/// Planned renditions for one file, ordered small → medium → large.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivationPlan {
    pub specs: Vec<RenditionSpec>,
}

impl DerivationPlan {
    pub fn labels(&self) -> Vec<Label> {
        self.specs.iter().map(|s| s.label).collect()
    }

    #[cfg(test)]
    pub(crate) fn width(&self, label: Label) -> Option<u32> {
        self.specs.iter().find(|s| s.label == label).map(|s| s.width)
    }
}

/// Plan the renditions for `source` under the configured rules.
pub fn plan_renditions(source: &Path, rules: &RenditionsConfig) -> DerivationPlan {
    let labels: &[Label] = if naming::is_cover(source, &rules.cover_file) {
        &[Label::Small, Label::Medium, Label::Large]
    } else {
        &[Label::Small, Label::Large]
    };

    let specs = labels
        .iter()
        .map(|&label| {
            let size = rules.size(label);
            RenditionSpec {
                label,
                width: size.width,
                quality: Quality::new(size.quality),
            }
        })
        .collect();

    DerivationPlan { specs }
}
