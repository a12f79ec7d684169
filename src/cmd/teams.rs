//! Participant listing: `draftroom teams`.

use anyhow::Result;
use console::style;

use draftroom::catalog::Catalog;
use draftroom::ui::board::{format_board, format_participants};

pub fn cmd_teams() -> Result<()> {
    let catalog = Catalog::builtin();
    catalog.validate()?;

    println!();
    println!("{}", style("Participants (draft order)").bold().underlined());
    println!("{}", format_participants(&catalog));
    println!();
    println!(
        "{}",
        style(format!("Prospects ({})", catalog.candidates().len()))
            .bold()
            .underlined()
    );
    println!("{}", format_board(catalog.candidates(), catalog.candidates().len()));
    println!();
    println!("Run 'draftroom run --team <ID>' to take control of a participant.");
    Ok(())
}
