pub mod assets;
pub mod location;
pub mod messages;
pub mod outcome;
pub mod phase;
pub mod screen;
pub mod trial;

pub use assets::{AssetPaths, InstructionScreen, SoundKind, SoundTable, existing_asset};
pub use location::{
    MAX_LOCATION, MIN_LOCATION, STEP_UNITS, advance_location, clamp_location, normalize_location,
    step_location,
};
pub use messages::{InputMode, Language, MessageKey, catalog};
pub use outcome::{DoorDraws, DoorResolution, DoorState, DoorTransitionError, resolve_door};
pub use phase::{DoorPhase, Phase, SESSION_COUNT};
pub use screen::{DoorStage, DoorView, Screen};
pub use trial::{DoorStatus, OutcomeKind, TrialRecord, TrialState, round2};
