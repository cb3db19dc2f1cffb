// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Cell types
//!
//! A [`CellType`] is the immutable "gene" shared by every cell built from it.
//! Stems divide, muscles act on their own body and attachments, and neurons
//! turn the charge of their neighbors into their own charge.
//!
//! Every reference a type makes to a cell's attachments is an *attachment
//! index*: a position in that cell's attachment slots (see
//! [`AttachmentSlots`](super::AttachmentSlots)).

use crate::arena::Handle;
use crate::error::{SimError, SimResult};
use crate::physics::AttachmentConfig;

/// Behavior of a cell, shared by every cell of the type
#[derive(Debug, Clone, PartialEq)]
pub enum CellType {
    /// Divides into two children once old and heavy enough
    Stem(StemCell),
    /// Pins its body and drives attachment lengths from neighbor charge
    Muscle(MuscleCell),
    /// Periodically recomputes its charge from neighbor charge
    Neuron(NeuronCell),
}

/// Variant tag of a [`CellType`]
///
/// The ordinal is stable and used by renderers to pick a texture row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellKind {
    /// [`CellType::Stem`]
    Stem,
    /// [`CellType::Muscle`]
    Muscle,
    /// [`CellType::Neuron`]
    Neuron,
}

impl CellKind {
    /// Stable ordinal of the tag
    pub fn ordinal(self) -> usize {
        match self {
            CellKind::Stem => 0,
            CellKind::Muscle => 1,
            CellKind::Neuron => 2,
        }
    }
}

impl CellType {
    /// Variant tag
    pub fn kind(&self) -> CellKind {
        match self {
            CellType::Stem(_) => CellKind::Stem,
            CellType::Muscle(_) => CellKind::Muscle,
            CellType::Neuron(_) => CellKind::Neuron,
        }
    }

    /// Check values that would otherwise produce unusable bodies
    pub fn validate(&self) -> SimResult<()> {
        match self {
            CellType::Stem(stem) => stem.validate()?,
            CellType::Muscle(muscle) => {
                if !muscle.rules.iter().all(|rule| rule.weight.is_finite()) {
                    return Err(SimError::InvalidCellType("muscle weights must be finite"));
                }
            }
            CellType::Neuron(neuron) => {
                if !(neuron.update_offset.is_finite() && neuron.threshold.is_finite()) {
                    return Err(SimError::InvalidCellType(
                        "neuron offset and threshold must be finite",
                    ));
                }
                if !neuron.inputs.iter().all(|input| input.weight.is_finite()) {
                    return Err(SimError::InvalidCellType("neuron weights must be finite"));
                }
            }
        }
        Ok(())
    }
}

/// A dividing cell
#[derive(Debug, Clone, PartialEq)]
pub struct StemCell {
    /// Attachment between the two children, if any
    pub child_attachment: Option<AttachmentConfig>,
    /// Parent attachment indices handed down to child 0 and child 1
    pub passed_attachments: [Vec<usize>; 2],
    /// Child angles relative to the parent angle
    pub children_angles: [f32; 2],
    /// Types of child 0 and child 1
    pub children_types: [Handle<CellType>; 2],
    /// Parent mass needed before splitting
    pub min_split_mass: f32,
    /// Fraction of the parent mass going to child 0; child 1 gets the rest
    pub child0_amount: f32,
}

impl StemCell {
    /// Check the split parameters and the handed-down indices
    ///
    /// Each child list may name a parent index at most once, since a
    /// child can only be linked once to the same partner.
    pub fn validate(&self) -> SimResult<()> {
        if !(self.child0_amount > 0.0 && self.child0_amount < 1.0) {
            return Err(SimError::InvalidCellType(
                "child0_amount must lie strictly between 0 and 1",
            ));
        }
        if !self.children_angles.iter().all(|a| a.is_finite()) {
            return Err(SimError::InvalidCellType("children angles must be finite"));
        }
        if !(self.min_split_mass >= 0.0) {
            return Err(SimError::InvalidCellType(
                "min_split_mass must be non-negative",
            ));
        }
        for indices in &self.passed_attachments {
            let mut sorted = indices.clone();
            sorted.sort_unstable();
            if sorted.windows(2).any(|pair| pair[0] == pair[1]) {
                return Err(SimError::InvalidCellType(
                    "passed attachment indices must be unique per child",
                ));
            }
        }
        Ok(())
    }

    /// Even split into the two given types, no attachments
    pub fn new(children_types: [Handle<CellType>; 2]) -> Self {
        StemCell {
            child_attachment: None,
            passed_attachments: [Vec::new(), Vec::new()],
            children_angles: [0.0, 0.0],
            children_types,
            min_split_mass: 0.0,
            child0_amount: 0.5,
        }
    }

    /// Attach the two children to each other
    pub fn with_child_attachment(mut self, config: AttachmentConfig) -> Self {
        self.child_attachment = Some(config);
        self
    }

    /// Hand parent attachment indices down to each child
    pub fn with_passed_attachments(mut self, child0: Vec<usize>, child1: Vec<usize>) -> Self {
        self.passed_attachments = [child0, child1];
        self
    }

    /// Orient the children relative to the parent
    pub fn with_children_angles(mut self, child0: f32, child1: f32) -> Self {
        self.children_angles = [child0, child1];
        self
    }

    /// Set the mass fraction of child 0
    pub fn with_child0_amount(mut self, amount: f32) -> Self {
        self.child0_amount = amount;
        self
    }

    /// Set the minimum parent mass
    pub fn with_min_split_mass(mut self, mass: f32) -> Self {
        self.min_split_mass = mass;
        self
    }
}

/// Maps the charge across one attachment to the length of another
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MuscleRule {
    /// Attachment index whose far cell provides the charge
    pub input: usize,
    /// Attachment index whose rest distance is driven
    pub output: usize,
    /// Multiplier from charge to rest distance
    pub weight: f32,
}

/// A cell acting on its own body and attachments
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MuscleCell {
    /// Attachment index whose far charge pins the body
    pub fix_input: Option<usize>,
    /// Rest distance rules, applied in order
    pub rules: Vec<MuscleRule>,
}

/// Activation applied to a neuron's weighted input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// `1.0` above the threshold, `0.0` otherwise
    Step,
    /// Logistic curve centered on the threshold
    Sigmoid,
    /// Weighted input minus the threshold
    Linear,
}

impl Activation {
    /// Evaluate the activation
    pub fn apply(self, weighted: f32, threshold: f32) -> f32 {
        match self {
            Activation::Step => {
                if weighted > threshold {
                    1.0
                } else {
                    0.0
                }
            }
            Activation::Sigmoid => 1.0 / (1.0 + (-(weighted - threshold)).exp()),
            Activation::Linear => weighted - threshold,
        }
    }
}

/// One weighted neuron input
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeuronInput {
    /// Attachment index whose far cell provides the charge
    pub attachment: usize,
    /// Weight of that charge
    pub weight: f32,
}

/// A cell computing its charge from its neighbors
#[derive(Debug, Clone, PartialEq)]
pub struct NeuronCell {
    /// Activation function
    pub activation: Activation,
    /// Activation threshold
    pub threshold: f32,
    /// Seconds before the first evaluation of a fresh neuron
    pub update_offset: f32,
    /// Weighted inputs
    pub inputs: Vec<NeuronInput>,
}

impl NeuronCell {
    /// Neuron without inputs, evaluated for the first time after `update_offset`
    pub fn new(activation: Activation, threshold: f32, update_offset: f32) -> Self {
        NeuronCell {
            activation,
            threshold,
            update_offset,
            inputs: Vec::new(),
        }
    }

    /// Add a weighted input
    pub fn with_input(mut self, attachment: usize, weight: f32) -> Self {
        self.inputs.push(NeuronInput { attachment, weight });
        self
    }
}
