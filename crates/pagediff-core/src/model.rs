//! Comparison records as returned by the compare service

use crate::geometry::PageSize;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("difference {index} has no bounding box on either side")]
    MissingBoxes { index: usize },
    #[error("difference {index} is an {kind} but its boxes do not match (a: {has_a}, b: {has_b})")]
    KindMismatch {
        index: usize,
        kind: DiffKind,
        has_a: bool,
        has_b: bool,
    },
}

/// Kind of a single difference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffKind {
    Addition,
    Deletion,
    Modification,
}

impl DiffKind {
    pub fn label(self) -> &'static str {
        match self {
            DiffKind::Addition => "addition",
            DiffKind::Deletion => "deletion",
            DiffKind::Modification => "modification",
        }
    }
}

impl fmt::Display for DiffKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One of the two compared documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// The original document (left pane)
    A,
    /// The revised document (right pane)
    B,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::A, Side::B];

    /// Identifier used in side-qualified highlight keys
    pub fn file_id(self) -> &'static str {
        match self {
            Side::A => "file1",
            Side::B => "file2",
        }
    }

    pub fn other(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Side::A => 0,
            Side::B => 1,
        }
    }
}

/// Axis-aligned box in document space: `[x0, y0, x1, y1]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct BBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl BBox {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }
}

impl From<[f64; 4]> for BBox {
    fn from(v: [f64; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl From<BBox> for [f64; 4] {
    fn from(b: BBox) -> Self {
        [b.x0, b.y0, b.x1, b.y1]
    }
}

/// A single difference between the two documents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Difference {
    /// Page index shared by both documents
    pub page_index: usize,
    #[serde(rename = "type")]
    pub kind: DiffKind,
    #[serde(default)]
    pub bbox_a: Option<BBox>,
    #[serde(default)]
    pub bbox_b: Option<BBox>,
    #[serde(default)]
    pub text_a: Option<String>,
    #[serde(default)]
    pub text_b: Option<String>,
    /// Box top measured from the top of the whole document A
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub absolute_y_a: Option<f64>,
    /// Box top measured from the top of the whole document B
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub absolute_y_b: Option<f64>,
}

impl Difference {
    pub fn bbox(&self, side: Side) -> Option<&BBox> {
        match side {
            Side::A => self.bbox_a.as_ref(),
            Side::B => self.bbox_b.as_ref(),
        }
    }

    pub fn text(&self, side: Side) -> Option<&str> {
        match side {
            Side::A => self.text_a.as_deref(),
            Side::B => self.text_b.as_deref(),
        }
    }

    pub fn has_side(&self, side: Side) -> bool {
        self.bbox(side).is_some()
    }

    fn validate(&self, index: usize) -> Result<(), ModelError> {
        let has_a = self.bbox_a.is_some();
        let has_b = self.bbox_b.is_some();
        if !has_a && !has_b {
            return Err(ModelError::MissingBoxes { index });
        }
        let consistent = match self.kind {
            DiffKind::Addition => !has_a && has_b,
            DiffKind::Deletion => has_a && !has_b,
            DiffKind::Modification => has_a && has_b,
        };
        if !consistent {
            return Err(ModelError::KindMismatch {
                index,
                kind: self.kind,
                has_a,
                has_b,
            });
        }
        Ok(())
    }
}

/// Per-document metadata attached to a compare response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub total_height: f64,
    /// Natural page sizes, when the service reports them
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pages: Vec<PageSize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentInfoPair {
    pub a: DocumentInfo,
    pub b: DocumentInfo,
}

impl DocumentInfoPair {
    pub fn get(&self, side: Side) -> &DocumentInfo {
        match side {
            Side::A => &self.a,
            Side::B => &self.b,
        }
    }
}

/// Successful response of the compare service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompareResponse {
    pub document_info: DocumentInfoPair,
    pub differences: Vec<Difference>,
}

impl CompareResponse {
    /// Check every difference against the side/kind invariants
    pub fn validate(&self) -> Result<(), ModelError> {
        self.differences
            .iter()
            .enumerate()
            .try_for_each(|(index, diff)| diff.validate(index))
    }
}
