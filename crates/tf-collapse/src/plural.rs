//! Russian noun agreement for reply counts.

use serde::Deserialize;

/// The three noun forms a cardinal number can require.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NounForm {
    /// 1, 21, 101, ...
    NominativeSingular,
    /// 2-4, 22-24, ...
    GenitiveSingular,
    /// 0, 5-20, 25-30, ...
    GenitivePlural,
}

/// Picks the form agreeing with `count`.
///
/// The teens check runs first: 11-14 end in 1-4 but still take the genitive
/// plural.
pub fn plural_form(count: usize) -> NounForm {
    let mod10 = count % 10;
    let mod100 = count % 100;

    if (11..=14).contains(&mod100) {
        return NounForm::GenitivePlural;
    }
    if mod10 == 1 {
        return NounForm::NominativeSingular;
    }
    if (2..=4).contains(&mod10) {
        return NounForm::GenitiveSingular;
    }
    NounForm::GenitivePlural
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Nouns {
    pub nominative_singular: String,
    pub genitive_singular: String,
    pub genitive_plural: String,
}

impl Default for Nouns {
    fn default() -> Self {
        Self {
            nominative_singular: "комментарий".to_owned(),
            genitive_singular: "комментария".to_owned(),
            genitive_plural: "комментариев".to_owned(),
        }
    }
}

impl Nouns {
    pub fn form(&self, form: NounForm) -> &str {
        match form {
            NounForm::NominativeSingular => &self.nominative_singular,
            NounForm::GenitiveSingular => &self.genitive_singular,
            NounForm::GenitivePlural => &self.genitive_plural,
        }
    }

    pub fn pick(&self, count: usize) -> &str {
        self.form(plural_form(count))
    }

    pub(crate) fn is_complete(&self) -> bool {
        [
            &self.nominative_singular,
            &self.genitive_singular,
            &self.genitive_plural,
        ]
        .iter()
        .all(|word| !word.trim().is_empty())
    }
}
