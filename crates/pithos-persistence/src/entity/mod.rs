//! SeaORM entity definitions

pub mod member;
pub mod motion;
pub mod motion_option;
pub mod vote;

pub mod prelude {
    pub use super::member::Entity as Member;
    pub use super::motion::Entity as Motion;
    pub use super::motion_option::Entity as MotionOption;
    pub use super::vote::Entity as Vote;
}
