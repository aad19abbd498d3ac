//! Straphanger simulation engine.
//!
//! Runs the game core headlessly: a hecs world of pooled passengers, the
//! player's strap rig, and the sensor pipeline feeding it. Rendering,
//! collision detection and device I/O live in collaborating layers that
//! call in through [`engine::SimulationEngine`].
//!
//! | Module       | Purpose                                              |
//! |--------------|------------------------------------------------------|
//! | `components` | ECS components: bodies, passengers, reaction state   |
//! | `engine`     | Composition root and the fixed-order tick            |
//! | `input`      | Raw sensor atomics, reader thread, smoothing hub     |
//! | `npc`        | Passenger impact handling and world systems          |
//! | `player`     | Player action state machine and swing physics        |
//! | `pool`       | Per-kind passenger recycling                         |
//! | `stage`      | Stage/instigator traits for the outer game layer     |
//! | `straps`     | Grab-point registry                                  |

pub mod components;
pub mod engine;
pub mod input;
pub mod npc;
pub mod player;
pub mod pool;
pub mod stage;
pub mod straps;
