pub mod blade_class;
pub mod bounding_box;
pub mod bounding_box_with_keypoints;
pub mod detection;
pub mod keypoint;
pub mod point;
