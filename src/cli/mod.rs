// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Everything the user types arrives here first. Argument
// parsing is done by the `clap` crate; the real work is
// delegated to Layer 2 (application).
//
// Two commands are supported:
//   1. `train`   - trains a landmark network on an annotated dataset
//   2. `predict` - loads a checkpoint and annotates one face image

// Declare the commands submodule
pub mod commands;

use anyhow::{Context, Result};
use clap::Parser;
use commands::{Commands, PredictArgs, TrainArgs};

/// The main CLI struct. clap reads the fields and generates
/// argument parsing code automatically via the Parser derive macro.
#[derive(Parser, Debug)]
#[command(
    name = "face-keypoints",
    version = "0.1.0",
    about = "Train a CNN to locate 68 facial landmarks, then annotate face images."
)]
pub struct Cli {
    /// The subcommand to run (train or predict)
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch the parsed subcommand to its use case.
    /// The CLI layer only routes, it never computes.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)   => Self::run_train(args),
            Commands::Predict(args) => Self::run_predict(args),
        }
    }

    /// Handles the `train` subcommand: turn the args into a
    /// TrainConfig and hand off to Layer 2.
    fn run_train(args: TrainArgs) -> Result<()> {
        use crate::application::train_use_case::TrainUseCase;

        tracing::info!("Starting training on dataset in: {}", args.data_dir);

        // From<TrainArgs> keeps clap types out of the lower layers
        let use_case = TrainUseCase::new(args.into());
        use_case.execute()?;

        println!("Training complete. Checkpoints saved.");
        Ok(())
    }

    /// Handles the `predict` subcommand.
    /// Loads the model from checkpoint and prints the predicted landmarks.
    fn run_predict(args: PredictArgs) -> Result<()> {
        use crate::application::predict_use_case::PredictUseCase;
        use crate::domain::traits::KeypointPredictor;

        // Build the use case from the saved checkpoint directory
        let use_case = PredictUseCase::new(args.checkpoint_dir.clone())?;

        // Run inference on the requested image
        let keypoints = use_case.predict_keypoints(&args.image)?;

        let json = serde_json::to_string_pretty(&keypoints)?;
        match args.out {
            Some(path) => {
                std::fs::write(&path, &json).with_context(|| {
                    format!("failed to write landmarks to '{}'", path.display())
                })?;
                println!("Landmarks written to {}", path.display());
            }
            None => println!("{}", json),
        }
        Ok(())
    }
}
