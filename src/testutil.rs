use crate::types::{
    Handedness, INDEX_PIP, INDEX_TIP, JOINT_COUNT, Joint, JointSet, MIDDLE_PIP, MIDDLE_TIP,
    PINKY_PIP, PINKY_TIP, RING_PIP, RING_TIP, THUMB_IP, THUMB_TIP, WRIST,
};

const FINGERS: [(usize, usize, f32); 4] = [
    (INDEX_PIP, INDEX_TIP, 0.50),
    (MIDDLE_PIP, MIDDLE_TIP, 0.55),
    (RING_PIP, RING_TIP, 0.60),
    (PINKY_PIP, PINKY_TIP, 0.65),
];

/// Synthetic hand with the wrist below every finger joint. `up` lists thumb,
/// index, middle, ring, pinky.
pub fn hand(up: [bool; 5], handedness: Handedness) -> JointSet {
    let mut joints = [Joint::new(0.5, 0.5, 0.0); JOINT_COUNT];
    joints[WRIST] = Joint::new(0.5, 0.9, 0.0);

    joints[THUMB_IP] = Joint::new(0.35, 0.6, 0.0);
    let outward = match handedness {
        Handedness::Right => -0.05,
        Handedness::Left => 0.05,
    };
    let thumb_x = if up[0] { 0.35 + outward } else { 0.35 - outward };
    joints[THUMB_TIP] = Joint::new(thumb_x, 0.6, 0.0);

    for (i, (pip, tip, x)) in FINGERS.iter().enumerate() {
        joints[*pip] = Joint::new(*x, 0.5, 0.0);
        let tip_y = if up[i + 1] { 0.3 } else { 0.6 };
        joints[*tip] = Joint::new(*x, tip_y, 0.0);
    }

    JointSet::new(joints)
}

pub fn with_joint(set: &JointSet, index: usize, joint: Joint) -> JointSet {
    let mut joints = *set.joints();
    joints[index] = joint;
    JointSet::new(joints)
}

/// Same hand with every x coordinate shifted, as if the whole hand moved.
pub fn shifted(set: &JointSet, dx: f32) -> JointSet {
    let mut joints = *set.joints();
    for joint in &mut joints {
        joint.x += dx;
    }
    JointSet::new(joints)
}
