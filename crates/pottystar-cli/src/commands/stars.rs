use clap::Subcommand;
use pottystar_core::{Database, RewardCounter};

#[derive(Subcommand)]
pub enum StarsAction {
    /// Print the current star count
    Show {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set the star count back to zero
    Reset,
}

pub fn run(action: StarsAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut counter = RewardCounter::load(Database::open()?);

    match action {
        StarsAction::Show { json } => {
            if json {
                println!("{}", serde_json::json!({ "stars": counter.count() }));
            } else {
                println!("{}", counter.count());
            }
        }
        StarsAction::Reset => {
            counter.reset();
            println!("stars reset to 0");
        }
    }
    Ok(())
}
