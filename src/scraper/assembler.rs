use crate::models::{BasicInfo, Participation, PersonalBest, SwimmerRecord};
use crate::scraper::parsers::ParsedSwimmer;

/// Tag the extracted fragments with the id they were fetched under.
pub fn assemble_swimmer(
    external_id: u32,
    basic: BasicInfo,
    participations: Vec<Participation>,
    personal_bests: Vec<PersonalBest>,
) -> SwimmerRecord {
    SwimmerRecord {
        external_id,
        name: basic.name,
        gender: basic.gender,
        birth_year: basic.birth_year,
        club_name: basic.club_name,
        lpin_license_number: basic.lpin_license_number,
        federation_license_number: basic.federation_license_number,
        participations,
        personal_bests,
    }
}

impl ParsedSwimmer {
    pub fn into_record(self, external_id: u32) -> SwimmerRecord {
        assemble_swimmer(external_id, self.basic, self.participations, self.personal_bests)
    }
}
