use crate::{
    config::ClassifierConfig,
    history::WristHistory,
    types::{
        FingerState, GestureLabel, Handedness, INDEX_PIP, INDEX_TIP, JointSet, MIDDLE_PIP,
        MIDDLE_TIP, PINKY_PIP, PINKY_TIP, RING_PIP, RING_TIP, THUMB_IP, THUMB_TIP,
    },
};

type Rule = fn(&RuleInput<'_>) -> Option<GestureLabel>;

/// Classification rules in precedence order. The first rule that returns a
/// label decides the frame.
const RULES: [(&str, Rule); 6] = [
    ("open_palm", open_palm),
    ("fist", fist),
    ("thumbs", thumbs),
    ("ok", ok_sign),
    ("peace", peace),
    ("wave", wave),
];

pub struct GestureClassifier {
    config: ClassifierConfig,
}

impl GestureClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    /// Maps one frame to exactly one label, `GestureLabel::None` when no rule
    /// matches. Pure: the history is only read.
    pub fn classify(
        &self,
        joints: &JointSet,
        handedness: Handedness,
        history: Option<&WristHistory>,
    ) -> GestureLabel {
        let input = RuleInput {
            joints,
            fingers: finger_state(joints, handedness),
            history,
            config: &self.config,
        };

        RULES
            .iter()
            .find_map(|(_, rule)| rule(&input))
            .unwrap_or(GestureLabel::None)
    }
}

impl Default for GestureClassifier {
    fn default() -> Self {
        Self::new(ClassifierConfig::default())
    }
}

/// Extended flags for all five fingers.
///
/// Assumes the palm faces the camera in a mirrored (selfie) image: a finger is
/// up when its tip sits above the joint below it, and the thumb is out when its
/// tip points away from the palm along x, which flips with handedness.
pub fn finger_state(joints: &JointSet, handedness: Handedness) -> FingerState {
    FingerState {
        thumb: thumb_extended(joints, handedness),
        index: finger_extended(joints, INDEX_TIP, INDEX_PIP),
        middle: finger_extended(joints, MIDDLE_TIP, MIDDLE_PIP),
        ring: finger_extended(joints, RING_TIP, RING_PIP),
        pinky: finger_extended(joints, PINKY_TIP, PINKY_PIP),
    }
}

fn finger_extended(joints: &JointSet, tip: usize, pip: usize) -> bool {
    joints.joint(tip).y < joints.joint(pip).y
}

fn thumb_extended(joints: &JointSet, handedness: Handedness) -> bool {
    let tip_x = joints.joint(THUMB_TIP).x;
    let ip_x = joints.joint(THUMB_IP).x;
    match handedness {
        Handedness::Right => tip_x < ip_x,
        Handedness::Left => tip_x > ip_x,
    }
}

struct RuleInput<'a> {
    joints: &'a JointSet,
    fingers: FingerState,
    history: Option<&'a WristHistory>,
    config: &'a ClassifierConfig,
}

fn open_palm(input: &RuleInput<'_>) -> Option<GestureLabel> {
    let f = input.fingers;
    (f.up_count() >= 4 && f.index && f.middle && f.ring && f.pinky).then_some(GestureLabel::OpenPalm)
}

fn fist(input: &RuleInput<'_>) -> Option<GestureLabel> {
    (input.fingers.up_count() == 0).then_some(GestureLabel::Fist)
}

// Only fires for an upright hand (index PIP below the wrist); an inverted
// thumbs gesture falls through to the later rules.
fn thumbs(input: &RuleInput<'_>) -> Option<GestureLabel> {
    let f = input.fingers;
    let thumb_only = f.thumb && !(f.index || f.middle || f.ring || f.pinky);
    if !thumb_only {
        return None;
    }

    let wrist = input.joints.wrist();
    let vertical_delta = input.joints.joint(INDEX_PIP).y - wrist.y;
    if vertical_delta <= 0.0 {
        return None;
    }

    if input.joints.joint(THUMB_TIP).y < wrist.y {
        Some(GestureLabel::ThumbsUp)
    } else {
        Some(GestureLabel::ThumbsDown)
    }
}

fn ok_sign(input: &RuleInput<'_>) -> Option<GestureLabel> {
    let gap = input
        .joints
        .joint(THUMB_TIP)
        .distance_xy(input.joints.joint(INDEX_TIP));
    (gap < input.config.ok_distance && !input.fingers.middle).then_some(GestureLabel::Ok)
}

fn peace(input: &RuleInput<'_>) -> Option<GestureLabel> {
    let f = input.fingers;
    (f.index && f.middle && !(f.ring || f.pinky) && !f.thumb).then_some(GestureLabel::Peace)
}

fn wave(input: &RuleInput<'_>) -> Option<GestureLabel> {
    let history = input.history?;
    let f = input.fingers;
    if history.len() < input.config.wave_min_samples || !f.index || f.middle {
        return None;
    }
    (history.amplitude() > input.config.wave_amplitude).then_some(GestureLabel::No)
}
