use std::time::Instant;

use serde::Deserialize;

use crate::error::GestureError;

pub const JOINT_COUNT: usize = 21;

pub const WRIST: usize = 0;
pub const THUMB_IP: usize = 3;
pub const THUMB_TIP: usize = 4;
pub const INDEX_PIP: usize = 6;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_TIP: usize = 12;
pub const RING_PIP: usize = 14;
pub const RING_TIP: usize = 16;
pub const PINKY_PIP: usize = 18;
pub const PINKY_TIP: usize = 20;

/// One normalized landmark: x and y in image space (0..1), z relative depth.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Joint {
    pub x: f32,
    pub y: f32,
    #[allow(dead_code)]
    pub z: f32,
}

impl Joint {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Planar distance, ignoring depth.
    pub fn distance_xy(&self, other: &Joint) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// The 21 hand landmarks of a single frame, in fixed anatomical order.
#[derive(Clone, Debug, PartialEq)]
pub struct JointSet {
    joints: [Joint; JOINT_COUNT],
}

impl JointSet {
    pub fn new(joints: [Joint; JOINT_COUNT]) -> Self {
        Self { joints }
    }

    pub fn joint(&self, index: usize) -> &Joint {
        &self.joints[index]
    }

    pub fn wrist(&self) -> &Joint {
        &self.joints[WRIST]
    }

    #[allow(dead_code)]
    pub fn joints(&self) -> &[Joint; JOINT_COUNT] {
        &self.joints
    }

    /// Reflects the set horizontally (x -> 1 - x) for sources that are not
    /// already selfie-mirrored.
    pub fn mirrored(&self) -> Self {
        let mut joints = self.joints;
        for joint in &mut joints {
            joint.x = 1.0 - joint.x;
        }
        Self { joints }
    }
}

impl TryFrom<&[[f32; 3]]> for JointSet {
    type Error = GestureError;

    fn try_from(points: &[[f32; 3]]) -> Result<Self, Self::Error> {
        if points.len() != JOINT_COUNT {
            return Err(GestureError::InvalidInput {
                expected: JOINT_COUNT,
                actual: points.len(),
            });
        }

        let mut joints = [Joint::default(); JOINT_COUNT];
        for (slot, [x, y, z]) in joints.iter_mut().zip(points) {
            *slot = Joint::new(*x, *y, *z);
        }
        Ok(Self { joints })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    pub fn label(&self) -> &'static str {
        match self {
            Handedness::Left => "Left",
            Handedness::Right => "Right",
        }
    }
}

/// Extended/retracted flag per finger, derived fresh every frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FingerState {
    pub thumb: bool,
    pub index: bool,
    pub middle: bool,
    pub ring: bool,
    pub pinky: bool,
}

impl FingerState {
    pub fn up_count(&self) -> usize {
        [self.thumb, self.index, self.middle, self.ring, self.pinky]
            .iter()
            .filter(|up| **up)
            .count()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum GestureLabel {
    OpenPalm,
    Fist,
    ThumbsUp,
    ThumbsDown,
    Ok,
    Peace,
    No,
    #[default]
    None,
}

impl GestureLabel {
    #[allow(dead_code)]
    pub const RECOGNIZED: [GestureLabel; 7] = [
        GestureLabel::OpenPalm,
        GestureLabel::Fist,
        GestureLabel::ThumbsUp,
        GestureLabel::ThumbsDown,
        GestureLabel::Ok,
        GestureLabel::Peace,
        GestureLabel::No,
    ];

    /// Key used in the label file. `None` has no phrase and therefore no key.
    pub fn key(&self) -> Option<&'static str> {
        match self {
            GestureLabel::OpenPalm => Some("OPEN_PALM"),
            GestureLabel::Fist => Some("FIST"),
            GestureLabel::ThumbsUp => Some("THUMBS_UP"),
            GestureLabel::ThumbsDown => Some("THUMBS_DOWN"),
            GestureLabel::Ok => Some("OK"),
            GestureLabel::Peace => Some("PEACE"),
            GestureLabel::No => Some("NO"),
            GestureLabel::None => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, GestureLabel::None)
    }
}

/// A single tracked hand as reported by the landmark source.
#[derive(Clone, Debug)]
pub struct HandObservation {
    pub joints: JointSet,
    pub handedness: Handedness,
    #[allow(dead_code)]
    pub score: f32,
}

#[derive(Clone, Debug)]
pub struct LandmarkFrame {
    pub hand: Option<HandObservation>,
    pub timestamp: Instant,
}

impl LandmarkFrame {
    pub fn empty() -> Self {
        Self {
            hand: None,
            timestamp: Instant::now(),
        }
    }

    pub fn with_hand(hand: HandObservation) -> Self {
        Self {
            hand: Some(hand),
            timestamp: Instant::now(),
        }
    }
}
