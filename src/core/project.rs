//! # Project File Manager
//!
//! Decides whether "New Project" / "Open Project" can proceed directly or
//! needs a confirmation dialog first.
//!
//! ```text
//!                 new_project()                      open_project()
//!                      │                                   │
//!             check directory                      check directory
//!          ┌───────────┴──────────┐            ┌───────────┴──────────┐
//!      IsProject            NotProject     NotProject             IsProject
//!          │                      │            │                      │
//!   new-project dialog      create now   open-project dialog     open now
//!          │                                   │
//!          ├── confirm → open_project_confirmation() ──┤
//!          └── cancel  → reset_is_project_flag()  ─────┘
//! ```

use std::io;
use std::path::{Path, PathBuf};

use log::{info, warn};

/// Directory that marks a folder as a codeconsole project.
pub const PROJECT_MARKER: &str = ".codeconsole";

/// Result of the last directory check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectDirState {
    #[default]
    Unknown,
    IsProject,
    NotProject,
}

/// File-system side of project handling.
pub trait ProjectFs {
    fn is_project_directory(&self, path: &Path) -> io::Result<bool>;

    /// Make `path` the active project, initializing it if needed.
    fn switch_project(&self, path: &Path) -> io::Result<()>;
}

/// Marker-directory based project detection on the local disk.
pub struct LocalProjectFs;

impl ProjectFs for LocalProjectFs {
    fn is_project_directory(&self, path: &Path) -> io::Result<bool> {
        if !path.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} is not a directory", path.display()),
            ));
        }
        Ok(path.join(PROJECT_MARKER).is_dir())
    }

    fn switch_project(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path.join(PROJECT_MARKER))
    }
}

pub struct ProjectFileManager<F: ProjectFs> {
    fs: F,
    pub directory: PathBuf,
    pub is_project_directory: ProjectDirState,
    pub is_new_project_modal_open: bool,
    pub is_open_project_modal_open: bool,
    /// Directory of the active project, once one has been opened or created.
    pub current_project: Option<PathBuf>,
}

impl<F: ProjectFs> ProjectFileManager<F> {
    pub fn new(fs: F, directory: PathBuf) -> Self {
        Self {
            fs,
            directory,
            is_project_directory: ProjectDirState::Unknown,
            is_new_project_modal_open: false,
            is_open_project_modal_open: false,
            current_project: None,
        }
    }

    /// "New Project": confirm first if the directory already is a project.
    pub fn new_project(&mut self) {
        self.is_project_directory = self.check();
        match self.is_project_directory {
            ProjectDirState::IsProject => self.is_new_project_modal_open = true,
            ProjectDirState::NotProject => {
                self.switch();
            }
            ProjectDirState::Unknown => {}
        }
    }

    /// "Open Project": confirm first if the directory is not a project.
    pub fn open_project(&mut self) {
        self.is_project_directory = self.check();
        match self.is_project_directory {
            ProjectDirState::NotProject => self.is_open_project_modal_open = true,
            ProjectDirState::IsProject => {
                self.switch();
            }
            ProjectDirState::Unknown => {}
        }
    }

    /// Confirm either dialog: open the directory as a project.
    pub fn open_project_confirmation(&mut self) {
        self.switch();
        self.reset_is_project_flag();
    }

    /// Cancel either dialog.
    pub fn reset_is_project_flag(&mut self) {
        self.is_project_directory = ProjectDirState::Unknown;
        self.is_new_project_modal_open = false;
        self.is_open_project_modal_open = false;
    }

    pub fn new_project_dialog_visible(&self) -> bool {
        self.is_project_directory == ProjectDirState::IsProject && self.is_new_project_modal_open
    }

    pub fn open_project_dialog_visible(&self) -> bool {
        self.is_project_directory == ProjectDirState::NotProject && self.is_open_project_modal_open
    }

    fn check(&self) -> ProjectDirState {
        match self.fs.is_project_directory(&self.directory) {
            Ok(true) => ProjectDirState::IsProject,
            Ok(false) => ProjectDirState::NotProject,
            Err(e) => {
                warn!("Project check failed for {}: {}", self.directory.display(), e);
                ProjectDirState::Unknown
            }
        }
    }

    fn switch(&mut self) -> bool {
        match self.fs.switch_project(&self.directory) {
            Ok(()) => {
                info!("Switched to project {}", self.directory.display());
                self.current_project = Some(self.directory.clone());
                true
            }
            Err(e) => {
                warn!("Failed to switch to project {}: {}", self.directory.display(), e);
                false
            }
        }
    }
}
