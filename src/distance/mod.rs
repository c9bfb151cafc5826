// SPDX-License-Identifier: MIT
// Distance submodule structure: one file per metric family plus the shared
// alignment types.
pub mod damerau_levenshtein;
pub mod editops;
pub mod hamming;
pub mod indel;
pub mod lcs_seq;
pub mod levenshtein;
pub mod osa;
