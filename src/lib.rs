pub mod capture;
pub mod config;
pub mod course;
pub mod detection;
pub mod games;
pub mod gesture;
pub mod input;
pub mod leaderboard;
pub mod models;
pub mod pipeline;
pub mod session;

pub use capture::{CaptureThread, FrameSource, ImageDirectorySource, LatestFrame};
pub use config::ArcadeConfig;
pub use course::{CourseDefinition, CourseMask, PathValidator};
pub use detection::{TrackingPipeline, TrackingTick};
pub use games::{
    FrameGame, GameInput, LandmarkGame, LaunchContext, Minigame, PoseGame, SessionReport, TickGame,
};
pub use gesture::{
    GestureCursor, Hand, LandmarkRecording, LandmarkSource, Pose, PoseRecording, PoseSource,
};
pub use input::{AutoPilot, InputSource};
pub use leaderboard::{CsvLeaderboard, LeaderboardEntry, LeaderboardStore};
pub use models::{Blob, Cursor, Point, Rect, Resolution};
pub use pipeline::{CursorPipeline, CursorStage, DebugConfig, ExponentialSmoothing, ScreenClamp};
pub use session::{GameSession, GameState, InputEvent, Outcome, SessionSignal};
