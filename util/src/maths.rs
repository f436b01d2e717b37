//! Utility maths functions
//!
//! Angles handled by the robot are in degrees, with headings kept in the range (-180, 180].

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Normalise an angle in degrees into the range (-180, 180].
///
/// Unlike a single wrap this handles angles several turns away from the range, so the result is
/// always inside the range and the function is idempotent.
pub fn normalize_angle_deg<T>(angle: T) -> T
where
    T: Float
{
    let half_turn = T::from(180.0).unwrap();
    let full_turn = T::from(360.0).unwrap();

    let mut a = angle % full_turn;

    if a > half_turn {
        a = a - full_turn;
    }
    if a <= -half_turn {
        a = a + full_turn;
    }

    a
}

/// Signed rotation in degrees that takes `current` onto `target`, the shortest way round.
pub fn angle_to_reach_deg<T>(current: T, target: T) -> T
where
    T: Float
{
    normalize_angle_deg(target - current)
}
