// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the `train` and `predict` subcommands and their flags.
//
// The clap derive macros generate the --help text, the errors
// for missing or malformed args, and the string → usize/f64
// conversions, so none of that is written by hand here.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::application::train_use_case::TrainConfig;
use crate::ml::model::Architecture;

/// Top-level subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train a landmark network on an annotated face dataset
    Train(TrainArgs),

    /// Predict 68 face landmarks using a trained checkpoint
    Predict(PredictArgs),
}

/// Network variant selector as it appears on the command line.
/// Kept separate from the ml-layer enum so clap types stay in Layer 1.
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum ArchChoice {
    /// Five plain conv stages with stepped dropout
    Net,
    /// Four batch-normalised conv stages, two hidden layers
    Net2,
    /// Same conv stack as net2 with a 4000-wide first hidden layer
    Net3,
}

impl From<ArchChoice> for Architecture {
    fn from(choice: ArchChoice) -> Self {
        match choice {
            ArchChoice::Net  => Architecture::Net,
            ArchChoice::Net2 => Architecture::Net2,
            ArchChoice::Net3 => Architecture::Net3,
        }
    }
}

/// Flags of the `train` command; every field is one --flag and
/// the defaults mirror TrainConfig::default().
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Directory containing keypoints.csv and an images/ subdirectory
    #[arg(long, default_value = "data/faces")]
    pub data_dir: String,

    /// Directory to save model checkpoints and training metrics
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Which network variant to train
    #[arg(long, value_enum, default_value = "net")]
    pub arch: ArchChoice,

    /// How many faces go through the network per optimiser step
    #[arg(long, default_value_t = 10)]
    pub batch_size: usize,

    /// Full passes over the training set
    #[arg(long, default_value_t = 10)]
    pub epochs: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// Dropout probability in the fully connected head (net2/net3)
    #[arg(long, default_value_t = 0.2)]
    pub dropout: f64,

    /// Fraction of samples held out for validation
    #[arg(long, default_value_t = 0.2)]
    pub val_fraction: f64,

    /// Shorter image side after rescaling, before the crop
    #[arg(long, default_value_t = 250)]
    pub rescale_size: u32,

    /// Side of the square crop fed to the network.
    /// The stock variants expect 224.
    #[arg(long, default_value_t = 224)]
    pub crop_size: u32,

    /// Seed for the train/validation split and crop augmentation
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// This is the boundary between Layer 1 and Layer 2:
/// the application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data_dir:       a.data_dir,
            checkpoint_dir: a.checkpoint_dir,
            arch:           a.arch.into(),
            batch_size:     a.batch_size,
            epochs:         a.epochs,
            lr:             a.lr,
            dropout:        a.dropout,
            val_fraction:   a.val_fraction,
            rescale_size:   a.rescale_size,
            crop_size:      a.crop_size,
            seed:           a.seed,
        }
    }
}

/// All arguments for the `predict` command
#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Path of the face image to annotate
    #[arg(long)]
    pub image: PathBuf,

    /// Directory the `train` run saved its checkpoints to
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Write the predicted landmarks to this JSON file
    /// instead of printing them to stdout
    #[arg(long)]
    pub out: Option<PathBuf>,
}
