//! Built-in catalog data
//!
//! Two published courses are always offered alongside user-created ones, and
//! a handful of welcome notes are written on first start so the peer
//! exchange is not empty.

use crate::course::{Course, Section};
use crate::peer::{NoteType, PeerNote};

const NANOS_PER_MILLI: u64 = 1_000_000;

fn section(id: &str, title: &str, content: &str, order: u32) -> Section {
    Section {
        id: id.to_string(),
        title: title.to_string(),
        content: content.to_string(),
        order,
    }
}

/// The built-in published courses, stamped with `now`.
pub fn seed_courses(now: u64) -> Vec<Course> {
    vec![
        Course {
            id: "course1".to_string(),
            title: "Introduction to Blockchain".to_string(),
            description: "Master the fundamentals of blockchain technology, cryptocurrency, \
                          and distributed systems, from basic concepts to advanced implementations."
                .to_string(),
            educator_id: "prof-rajesh-kumar".to_string(),
            sections: vec![
                section(
                    "intro-blockchain",
                    "What is Blockchain?",
                    "A blockchain is a distributed ledger of blocks linked by hashes. \
                     Each block commits to its predecessor, so history cannot be rewritten \
                     without redoing all later work.",
                    0,
                ),
                section(
                    "crypto-foundations",
                    "Cryptographic Foundations",
                    "Hash functions, the avalanche effect, digital signatures and Merkle trees.",
                    1,
                ),
                section(
                    "consensus-mechanisms",
                    "Consensus Mechanisms",
                    "Proof of Work, Proof of Stake, delegated schemes and BFT protocols, \
                     and the trade-offs between them.",
                    2,
                ),
                section(
                    "blockchain-types",
                    "Types of Blockchains",
                    "Public, private, consortium and hybrid networks.",
                    3,
                ),
                section(
                    "practical-applications",
                    "Practical Applications",
                    "Payments, supply chains, identity, and decentralized finance.",
                    4,
                ),
            ],
            created_at: now,
            updated_at: now,
            published: true,
            token_reward: 50,
        },
        Course {
            id: "course2".to_string(),
            title: "Smart Contracts & DApp Development".to_string(),
            description: "Master smart contract development and build decentralized applications. \
                          Learn Solidity, Web3 tooling, and modern DApp architecture patterns."
                .to_string(),
            educator_id: "dr-priya-sharma".to_string(),
            sections: vec![
                section(
                    "smart-contract-basics",
                    "Smart Contract Basics",
                    "Contracts as programs stored on chain: state, functions, events and gas.",
                    0,
                ),
                section(
                    "solidity-programming",
                    "Solidity Programming",
                    "Types, visibility, modifiers, payable functions and common pitfalls.",
                    1,
                ),
                section(
                    "dapp-architecture",
                    "DApp Architecture",
                    "Front ends, wallets, indexers and off-chain storage around a contract core.",
                    2,
                ),
            ],
            created_at: now,
            updated_at: now,
            published: true,
            token_reward: 75,
        },
    ]
}

fn note(
    id: &str,
    course_id: &str,
    author: &str,
    author_name: &str,
    content: &str,
    note_type: NoteType,
    created_at: u64,
    tips_received: u64,
) -> PeerNote {
    PeerNote {
        id: id.to_string(),
        course_id: course_id.to_string(),
        author: author.to_string(),
        author_name: author_name.to_string(),
        content: content.to_string(),
        note_type,
        created_at,
        updated_at: created_at,
        tips_received,
    }
}

/// Welcome notes written into an empty store, aged relative to `now`.
pub fn seed_notes(now: u64) -> Vec<PeerNote> {
    let ago = |millis: u64| now.saturating_sub(millis * NANOS_PER_MILLI);
    vec![
        note(
            "default-note-1",
            "course2",
            "system",
            "Prof. Priya Sharma",
            "Welcome to the ICP Scholar peer community! Share knowledge, ask questions \
             and help each other succeed. Helpful notes earn tokens through tips.",
            NoteType::Tip,
            now,
            25,
        ),
        note(
            "default-note-2",
            "course1",
            "student-arjun",
            "Arjun Patel",
            "Finished the cryptographic foundations section. Implementing a hash \
             function yourself makes the avalanche effect click.",
            NoteType::StudyNote,
            ago(86_400_000),
            18,
        ),
        note(
            "default-note-3",
            "course1",
            "student-priya",
            "Priya Sharma",
            "How do Merkle proofs stay small when the tree has millions of leaves?",
            NoteType::Question,
            ago(43_200_000),
            15,
        ),
        note(
            "default-note-4",
            "course1",
            "student-vikram",
            "Vikram Singh",
            "A Merkle proof only carries one sibling hash per level, so its size grows \
             with the logarithm of the leaf count.",
            NoteType::Answer,
            ago(21_600_000),
            22,
        ),
        note(
            "default-note-5",
            "course2",
            "student-ananya",
            "Ananya Gupta",
            "Gas tips: pack struct fields, batch mints, and keep metadata off chain.",
            NoteType::StudyNote,
            ago(10_800_000),
            12,
        ),
        note(
            "default-note-6",
            "course2",
            "student-rahul",
            "Rahul Mehta",
            "Audit checklist: reentrancy guards, access control, checked external calls, \
             an emergency pause, and no timestamp dependence for critical logic.",
            NoteType::StudyNote,
            ago(7_200_000),
            28,
        ),
        note(
            "default-note-7",
            "course2",
            "student-kavya",
            "Kavya Reddy",
            "When is inline assembly worth the complexity for gas savings?",
            NoteType::Question,
            ago(3_600_000),
            8,
        ),
        note(
            "default-note-8",
            "course1",
            "student-dev",
            "Dev Patel",
            "Consensus comparison: PoW is secure but energy hungry, PoS finalizes faster, \
             delegated schemes trade decentralization for throughput.",
            NoteType::StudyNote,
            ago(1_800_000),
            16,
        ),
    ]
}
