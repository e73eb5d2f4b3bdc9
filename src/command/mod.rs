mod current;
mod run;
mod settings;

pub use current::current;
pub use run::run;
pub use settings::settings;
