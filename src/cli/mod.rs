//! Command workflows behind the binary's subcommands

pub mod orchestration;

pub use orchestration::{
    run_init_workflow, run_release_workflow, InitWorkflowResult, ReleaseWorkflowArgs,
};
