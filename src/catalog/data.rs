//! Built-in participant and candidate catalogs.
//!
//! Candidates are listed in rank order (id 1 is the best talent on the board).

use super::{Candidate, Participant, Position};

const CANDIDATES: &[(u32, &str, Position, &str, &str)] = &[
    (1, "Shedeur Sanders", Position::Qb, "Colorado", "Elite pocket passer with pinpoint accuracy and poise under pressure. Pro-ready mechanics."),
    (2, "Travis Hunter", Position::Cb, "Colorado", "Generational two-way talent at CB/WR. Lockdown corner with elite ball skills."),
    (3, "Cam Ward", Position::Qb, "Miami", "Dynamic playmaker with cannon arm and creativity. Improved decision-making as a senior."),
    (4, "Tetairoa McMillan", Position::Wr, "Arizona", "Dominant 6'5\" target with contested-catch ability. True WR1 prospect."),
    (5, "Abdul Carter", Position::Edge, "Penn State", "Explosive pass rusher with bend and power. Versatile defender who can play multiple spots."),
    (6, "Mason Graham", Position::Dt, "Michigan", "Dominant interior defender with rare power and quickness. Anchor in the middle."),
    (7, "Will Johnson", Position::Cb, "Michigan", "Physical corner with length and ball-hawking instincts. Shutdown potential."),
    (8, "Ashton Jeanty", Position::Rb, "Boise State", "Historic college rusher with vision, power, and breakaway speed. Heisman finalist."),
    (9, "Kelvin Banks Jr.", Position::Ot, "Texas", "Smooth pass protector with excellent footwork. Three-year starter at left tackle."),
    (10, "Will Campbell", Position::Ot, "LSU", "Powerful offensive tackle with mauling run-blocking ability. Rock-solid in protection."),
    (11, "Luther Burden III", Position::Wr, "Missouri", "Dynamic route runner with YAC ability. Electric with the ball in his hands."),
    (12, "Mykel Williams", Position::Edge, "Georgia", "Powerful and athletic edge setter. Disruptive against both run and pass."),
    (13, "Tyler Warren", Position::Te, "Penn State", "Swiss-army knife tight end who can line up everywhere. Elite receiving threat."),
    (14, "James Pearce Jr.", Position::Edge, "Tennessee", "Explosive first step with natural pass-rush moves. High motor and relentless effort."),
    (15, "Malaki Starks", Position::S, "Georgia", "Instinctive safety with range and physicality. Versatile coverage defender."),
    (16, "Jalon Walker", Position::Lb, "Georgia", "Explosive blitzer from the linebacker position. Pass-rush upside is special."),
    (17, "Nic Scourton", Position::Edge, "Texas A&M", "Long and powerful edge rusher with violent hands. Improved technique as a junior."),
    (18, "Emeka Egbuka", Position::Wr, "Ohio State", "Polished route runner and reliable hands. Championship-game performer."),
    (19, "Kenneth Grant", Position::Dt, "Michigan", "Massive interior presence with surprising athleticism. Collapses the pocket consistently."),
    (20, "Colston Loveland", Position::Te, "Michigan", "Athletic tight end with soft hands and seam-stretching ability."),
    (21, "Derrick Harmon", Position::Dt, "Oregon", "Quick-twitch interior rusher who wins with speed and leverage."),
    (22, "Aireontae Ersery", Position::Ot, "Minnesota", "Massive tackle with elite length. Powerful run blocker who moves defenders."),
    (23, "Isaiah Bond", Position::Wr, "Texas", "Blazing speedster who stretches defenses vertically. Dynamic after the catch."),
    (24, "Benjamin Morrison", Position::Cb, "Notre Dame", "Ball-hawking corner with elite interception production. Physical in press coverage."),
    (25, "Grey Zabel", Position::Og, "North Dakota State", "Versatile interior lineman with FCS dominance. Smart and technically sound."),
    (26, "Tyleik Williams", Position::Dt, "Ohio State", "Run-stuffing nose tackle with anchor strength. Two-gap defender."),
    (27, "Shavon Revel Jr.", Position::Cb, "East Carolina", "Long and physical corner with shutdown tools. Coming off strong junior season."),
    (28, "Josh Simmons", Position::Ot, "Ohio State", "Fluid pass protector with NFL-ready technique. Returned strong from knee injury."),
    (29, "Sheion O'Brien", Position::Wr, "Notre Dame", "Physical receiver with excellent body control. Reliable chain mover."),
    (30, "Nick Emmanwori", Position::S, "South Carolina", "Hard-hitting safety with intimidating physicality. Range has improved each year."),
];

const PARTICIPANTS: &[(u32, &str, &str, &[Position], &str)] = &[
    (
        1,
        "Las Vegas Raiders",
        "LV",
        &[Position::Qb, Position::Cb, Position::Ol],
        "No long-term QB after Geno Smith trade failed. Secondary leaks. O-line needs rebuilding.",
    ),
    (
        2,
        "New York Jets",
        "NYJ",
        &[Position::Ol, Position::Wr, Position::Qb],
        "Full roster reset after trade deadline teardown. O-line is the foundation to rebuild.",
    ),
    (
        3,
        "Arizona Cardinals",
        "ARI",
        &[Position::Qb, Position::Ol, Position::Wr],
        "Kyler Murray's future uncertain after 3-14 season. Offense needs major upgrades.",
    ),
    (
        4,
        "Tennessee Titans",
        "TEN",
        &[Position::Ol, Position::Wr, Position::Edge],
        "Must protect and support 2025 #1 pick Cam Ward. Need weapons and pass rush.",
    ),
    (
        5,
        "New York Giants",
        "NYG",
        &[Position::Wr, Position::Edge, Position::Ol],
        "Need playmakers around QB Jaxon Dart. Pass rush was inconsistent.",
    ),
    (
        6,
        "Cleveland Browns",
        "CLE",
        &[Position::Edge, Position::Wr, Position::Cb],
        "Fewest receiving yards in the NFL in 2025. Need pass rush help.",
    ),
    (
        7,
        "Washington Commanders",
        "WSH",
        &[Position::Edge, Position::Cb, Position::Lb],
        "Oldest roster in NFL. Defense needs youth and speed everywhere.",
    ),
];

pub(super) fn candidates() -> Vec<Candidate> {
    CANDIDATES
        .iter()
        .map(|&(id, name, position, school, summary)| Candidate {
            id,
            name: name.to_string(),
            position,
            school: school.to_string(),
            summary: summary.to_string(),
        })
        .collect()
}

pub(super) fn participants() -> Vec<Participant> {
    PARTICIPANTS
        .iter()
        .map(|&(id, name, abbreviation, needs, context)| Participant {
            id,
            name: name.to_string(),
            abbreviation: abbreviation.to_string(),
            needs: needs.to_vec(),
            context: context.to_string(),
        })
        .collect()
}
