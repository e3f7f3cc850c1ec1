//! Literal patterns shared by the record validator and the fallback
//! extractor. Profile-dependent patterns are compiled per instance instead.

use std::sync::OnceLock;

use regex::Regex;

macro_rules! re {
    ($name:ident, $pat:expr) => {
        pub(crate) fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

re!(re_rib_block, r"\b([0-9]{48})\b");
re!(re_reference, r"\b[0-9]{3}-[0-9]{6}\b");
re!(re_emission_after_zeros, r"0{6}([0-9]{8})");
// Processing date right after the amount cents, execution date glued to it.
re!(re_processing_dates, r"\.[0-9]{2}([0-9]{8})([0-9]{8})?");
re!(re_motif,
    r"[0-9]{20,}\s+([A-Za-zÀ-ÖØ-öø-ÿ' -]+?)(?:\s+[0-9]{3}-[0-9]{6}|\s*$)");
re!(re_paid_count, r"\.[0-9]{2}([0-9]+)");
