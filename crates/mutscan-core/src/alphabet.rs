//! Token vocabularies for protein language models.
//!
//! An [`Alphabet`] maps residue symbols to model token ids and back, and
//! knows which special tokens wrap a sequence. The ESM family shares one
//! vocabulary layout; models shipping a `tokenizer.json` build theirs with
//! [`Alphabet::new`].
use crate::error::{Result, ScanError};
use std::collections::HashMap;

/// The 20 standard amino acids in the order used for enumeration and for
/// the columns of the score matrix.
pub const AMINO_ACIDS: &str = "ACDEFGHIKLMNPQRSTVWY";
pub const AMINO_ACID_COUNT: usize = 20;

/// Returns true for one of the 20 standard amino acids.
pub fn is_amino_acid(symbol: char) -> bool {
    AMINO_ACIDS.contains(symbol)
}

// ESM vocabulary, in token-id order once the special tokens are added.
const ESM_PREPEND: [&str; 4] = ["<cls>", "<pad>", "<eos>", "<unk>"];
const ESM_STANDARD: [&str; 27] = [
    "L", "A", "G", "V", "S", "E", "R", "T", "I", "D", "P", "K", "Q", "N", "F", "Y", "M", "H", "W",
    "C", "X", "B", "U", "Z", "O", ".", "-",
];
const ESM_APPEND: [&str; 1] = ["<mask>"];

/// Names of the special tokens inside a vocabulary.
#[derive(Debug, Clone, Copy)]
pub struct SpecialTokens<'a> {
    pub bos: &'a str,
    pub eos: &'a str,
    pub mask: &'a str,
    pub pad: &'a str,
    pub unk: &'a str,
}

#[derive(Debug, Clone)]
pub struct Alphabet {
    tokens: Vec<String>,
    index: HashMap<String, u32>,
    bos_idx: u32,
    eos_idx: u32,
    mask_idx: u32,
    pad_idx: u32,
    unk_idx: u32,
    prepend_bos: bool,
    append_eos: bool,
}

impl Alphabet {
    /// Build an alphabet from a vocabulary listed in token-id order.
    pub fn new(
        tokens: Vec<String>,
        special: SpecialTokens<'_>,
        prepend_bos: bool,
        append_eos: bool,
    ) -> Result<Self> {
        let index: HashMap<String, u32> = tokens
            .iter()
            .enumerate()
            .map(|(i, tok)| (tok.clone(), i as u32))
            .collect();
        let lookup = |name: &str| {
            index
                .get(name)
                .copied()
                .ok_or_else(|| ScanError::UnknownSymbol(name.to_string()))
        };
        Ok(Self {
            bos_idx: lookup(special.bos)?,
            eos_idx: lookup(special.eos)?,
            mask_idx: lookup(special.mask)?,
            pad_idx: lookup(special.pad)?,
            unk_idx: lookup(special.unk)?,
            tokens,
            index,
            prepend_bos,
            append_eos,
        })
    }

    fn esm(append_eos: bool) -> Self {
        let mut tokens: Vec<String> = ESM_PREPEND
            .iter()
            .chain(ESM_STANDARD.iter())
            .map(|t| t.to_string())
            .collect();
        // the vocabulary is padded to a multiple of 8 before the mask token
        let padding = (8 - tokens.len() % 8) % 8;
        tokens.extend((1..=padding).map(|i| format!("<null_{}>", i)));
        tokens.extend(ESM_APPEND.iter().map(|t| t.to_string()));
        let special = SpecialTokens {
            bos: "<cls>",
            eos: "<eos>",
            mask: "<mask>",
            pad: "<pad>",
            unk: "<unk>",
        };
        Self::new(tokens, special, true, append_eos)
            .expect("the ESM vocabulary contains its special tokens")
    }

    /// ESM-1b / ESM-1v / ESM-2 vocabulary: `<cls> sequence <eos>`.
    pub fn esm1b() -> Self {
        Self::esm(true)
    }

    /// MSA Transformer vocabulary: every aligned row is `<cls> sequence`.
    pub fn msa_transformer() -> Self {
        Self::esm(false)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn bos_idx(&self) -> u32 {
        self.bos_idx
    }

    pub fn eos_idx(&self) -> u32 {
        self.eos_idx
    }

    pub fn mask_idx(&self) -> u32 {
        self.mask_idx
    }

    pub fn pad_idx(&self) -> u32 {
        self.pad_idx
    }

    pub fn unk_idx(&self) -> u32 {
        self.unk_idx
    }

    pub fn prepends_bos(&self) -> bool {
        self.prepend_bos
    }

    pub fn appends_eos(&self) -> bool {
        self.append_eos
    }

    /// Number of special tokens wrapped around each encoded sequence.
    pub fn special_token_count(&self) -> usize {
        usize::from(self.prepend_bos) + usize::from(self.append_eos)
    }

    /// Token position of the first residue.
    pub fn residue_offset(&self) -> usize {
        usize::from(self.prepend_bos)
    }

    pub fn symbol_to_index(&self, symbol: char) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.index
            .get(symbol.encode_utf8(&mut buf) as &str)
            .copied()
            .ok_or_else(|| ScanError::UnknownSymbol(symbol.to_string()))
    }

    pub fn index_to_symbol(&self, idx: u32) -> Option<&str> {
        self.tokens.get(idx as usize).map(String::as_str)
    }

    /// Token ids of `sequence` including the begin/end markers.
    pub fn tokenize(&self, sequence: &str) -> Result<Vec<u32>> {
        let mut ids = Vec::with_capacity(sequence.len() + self.special_token_count());
        if self.prepend_bos {
            ids.push(self.bos_idx);
        }
        for symbol in sequence.chars() {
            ids.push(self.symbol_to_index(symbol)?);
        }
        if self.append_eos {
            ids.push(self.eos_idx);
        }
        Ok(ids)
    }
}
