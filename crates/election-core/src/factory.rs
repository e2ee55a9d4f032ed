//! Random candidate factory.
//!
//! Every call independently samples a name, a party, a profession and
//! experience phrase, two to four distinct policy topics, and a profile
//! image from fixed pools. There is no shared state, so concurrent ticks can
//! call it freely; duplicate candidates across calls are expected.

use election_types::CandidateDraft;
use rand::Rng;
use rand::seq::IndexedRandom;

// -----------------------------------------------------------------------
// Pools
// -----------------------------------------------------------------------

/// First-name pool.
pub const FIRST_NAMES: &[&str] = &[
    "Alexander",
    "Sarah",
    "Michael",
    "Elena",
    "David",
    "Amanda",
    "Robert",
    "Maria",
    "James",
    "Jessica",
    "William",
    "Ashley",
    "Christopher",
    "Emily",
    "Matthew",
    "Lisa",
    "Anthony",
    "Michelle",
    "Daniel",
    "Jennifer",
    "Joshua",
    "Rachel",
    "Andrew",
    "Laura",
    "Kevin",
    "Rebecca",
    "Brian",
    "Stephanie",
    "Thomas",
    "Nicole",
    "Charles",
    "Angela",
    "Joseph",
    "Kimberly",
    "Patrick",
    "Deborah",
    "Richard",
    "Amy",
    "Mark",
    "Patricia",
];

/// Last-name pool.
pub const LAST_NAMES: &[&str] = &[
    "Smith",
    "Johnson",
    "Williams",
    "Brown",
    "Jones",
    "Garcia",
    "Miller",
    "Davis",
    "Rodriguez",
    "Martinez",
    "Hernandez",
    "Lopez",
    "Gonzalez",
    "Wilson",
    "Anderson",
    "Thomas",
    "Taylor",
    "Moore",
    "Jackson",
    "Martin",
    "Lee",
    "Perez",
    "Thompson",
    "White",
    "Harris",
    "Sanchez",
    "Clark",
    "Ramirez",
    "Lewis",
    "Robinson",
    "Walker",
    "Young",
    "Allen",
    "King",
    "Wright",
    "Scott",
    "Torres",
    "Nguyen",
    "Hill",
    "Flores",
];

/// Party label pool.
pub const PARTIES: &[&str] = &[
    "Progressive Alliance",
    "Unity Party",
    "Citizens First",
    "Economic Freedom",
    "Green Future",
    "Tech Innovation",
    "Social Reform",
    "Independent Coalition",
    "Liberty Movement",
    "Community Action",
    "Democratic Reform",
    "Conservative Union",
    "Workers Party",
    "Environmental Action",
    "New Vision",
    "People's Choice",
];

/// Profession pool.
pub const PROFESSIONS: &[&str] = &[
    "business owner",
    "teacher",
    "lawyer",
    "doctor",
    "engineer",
    "consultant",
    "nonprofit director",
    "community organizer",
    "former mayor",
    "city council member",
    "school board president",
    "healthcare administrator",
    "military veteran",
    "environmental scientist",
    "social worker",
    "union leader",
    "small business advocate",
    "technology executive",
    "public health official",
    "education administrator",
];

/// Experience phrase pool; each follows the profession directly.
pub const EXPERIENCES: &[&str] = &[
    "with over 15 years of community service",
    "and 10 years of public sector experience",
    "with extensive background in local government",
    "and proven track record in policy development",
    "with deep roots in the community",
    "and commitment to transparent governance",
    "with experience in grassroots organizing",
    "and background in fiscal management",
    "with expertise in sustainable development",
    "and history of bipartisan collaboration",
];

/// Policy topic pool.
pub const POLICIES: &[&str] = &[
    "economic development",
    "education reform",
    "healthcare access",
    "environmental protection",
    "affordable housing",
    "infrastructure improvement",
    "public safety",
    "social services",
    "technology innovation",
    "government transparency",
    "fiscal responsibility",
    "community engagement",
    "renewable energy",
    "transportation planning",
    "small business support",
    "youth programs",
];

/// Profile image pool.
pub const PROFILE_IMAGES: &[&str] = &[
    "https://images.unsplash.com/photo-1507003211169-0a1dd7228f2d?w=400&h=400&fit=crop&crop=face",
    "https://images.unsplash.com/photo-1494790108755-2616b332c2f8?w=400&h=400&fit=crop&crop=face",
    "https://images.unsplash.com/photo-1472099645785-5658abf4ff4e?w=400&h=400&fit=crop&crop=face",
    "https://images.unsplash.com/photo-1438761681033-6461ffad8d80?w=400&h=400&fit=crop&crop=face",
    "https://images.unsplash.com/photo-1500648767791-00dcc994a43e?w=400&h=400&fit=crop&crop=face",
    "https://images.unsplash.com/photo-1489424731084-a5d8b219a5bb?w=400&h=400&fit=crop&crop=face",
    "https://images.unsplash.com/photo-1506794778202-cad84cf45f1d?w=400&h=400&fit=crop&crop=face",
    "https://images.unsplash.com/photo-1519345182560-3f2917c472ef?w=400&h=400&fit=crop&crop=face",
    "https://images.unsplash.com/photo-1506277886164-e25aa3f4ef7f?w=400&h=400&fit=crop&crop=face",
    "https://images.unsplash.com/photo-1573496359142-b8d87734a5a2?w=400&h=400&fit=crop&crop=face",
];

/// Fewest policy topics named in a description.
pub const MIN_POLICIES: usize = 2;

/// Most policy topics named in a description.
pub const MAX_POLICIES: usize = 4;

const CLOSING: &str = "Committed to serving the community and bringing positive change \
                       through collaborative leadership and evidence-based policy making.";

// -----------------------------------------------------------------------
// Generation
// -----------------------------------------------------------------------

/// Produce a candidate draft using the thread-local RNG.
pub fn random_candidate() -> CandidateDraft {
    generate_candidate(&mut rand::rng())
}

/// Produce a candidate draft from the given RNG.
pub fn generate_candidate<R: Rng + ?Sized>(rng: &mut R) -> CandidateDraft {
    let first = pick(rng, FIRST_NAMES);
    let last = pick(rng, LAST_NAMES);
    let profession = pick(rng, PROFESSIONS);
    let experience = pick(rng, EXPERIENCES);

    let policy_count = rng.random_range(MIN_POLICIES..=MAX_POLICIES);
    let policies: Vec<&str> = POLICIES.choose_multiple(rng, policy_count).copied().collect();

    CandidateDraft {
        name: format!("{first} {last}"),
        image: pick(rng, PROFILE_IMAGES).to_owned(),
        party: pick(rng, PARTIES).to_owned(),
        description: format!(
            "{} {experience}. Focuses on {}. {CLOSING}",
            capitalize(profession),
            policies.join(", ")
        ),
    }
}

fn pick<R: Rng + ?Sized>(rng: &mut R, pool: &'static [&'static str]) -> &'static str {
    pool.choose(rng).copied().unwrap_or_default()
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn policies_in(description: &str) -> Vec<&str> {
        let start = description.find("Focuses on ").map_or(0, |i| i + "Focuses on ".len());
        let rest = description.get(start..).unwrap_or_default();
        let end = rest.find(". ").unwrap_or(rest.len());
        rest.get(..end).unwrap_or_default().split(", ").collect()
    }

    #[test]
    fn draft_fields_come_from_pools() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let draft = generate_candidate(&mut rng);
            let (first, last) = draft.name.split_once(' ').unwrap_or_default();
            assert!(FIRST_NAMES.contains(&first), "unexpected first name {first}");
            assert!(LAST_NAMES.contains(&last), "unexpected last name {last}");
            assert!(PARTIES.contains(&draft.party.as_str()));
            assert!(PROFILE_IMAGES.contains(&draft.image.as_str()));
            assert!(draft.description.ends_with(CLOSING));
        }
    }

    #[test]
    fn pools_hold_distinct_entries() {
        let pools: [(&[&str], usize); 7] = [
            (FIRST_NAMES, 40),
            (LAST_NAMES, 40),
            (PARTIES, 16),
            (PROFESSIONS, 20),
            (EXPERIENCES, 10),
            (POLICIES, 16),
            (PROFILE_IMAGES, 10),
        ];
        for (pool, size) in pools {
            assert_eq!(pool.len(), size);
            let mut sorted = pool.to_vec();
            sorted.sort_unstable();
            sorted.dedup();
            assert_eq!(sorted.len(), size, "duplicate entry in {pool:?}");
        }
    }

    #[test]
    fn policy_subset_is_two_to_four_distinct_topics() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut seen_sizes = [false; MAX_POLICIES + 1];
        for _ in 0..500 {
            let draft = generate_candidate(&mut rng);
            let mut topics = policies_in(&draft.description);
            assert!((MIN_POLICIES..=MAX_POLICIES).contains(&topics.len()));
            assert!(topics.iter().all(|t| POLICIES.contains(t)));
            if let Some(slot) = seen_sizes.get_mut(topics.len()) {
                *slot = true;
            }
            let before = topics.len();
            topics.sort_unstable();
            topics.dedup();
            assert_eq!(topics.len(), before, "policies must be distinct");
        }
        assert!(seen_sizes.iter().skip(MIN_POLICIES).all(|seen| *seen));
    }

    #[test]
    fn description_leads_with_capitalised_profession() {
        let mut rng = StdRng::seed_from_u64(3);
        let draft = generate_candidate(&mut rng);
        let matched = PROFESSIONS
            .iter()
            .any(|p| draft.description.starts_with(&capitalize(p)));
        assert!(matched, "description: {}", draft.description);
    }

    #[test]
    fn same_seed_same_candidate() {
        let a = generate_candidate(&mut StdRng::seed_from_u64(42));
        let b = generate_candidate(&mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn capitalize_handles_empty_and_ascii() {
        assert_eq!(capitalize(""), "");
        assert_eq!(capitalize("teacher"), "Teacher");
    }

    #[test]
    fn thread_rng_variant_is_usable_from_many_threads() {
        let handles: Vec<_> = (0..4)
            .map(|_| std::thread::spawn(random_candidate))
            .collect();
        for handle in handles {
            let draft = handle.join().unwrap_or_else(|_| random_candidate());
            assert!(!draft.name.is_empty());
        }
    }
}
