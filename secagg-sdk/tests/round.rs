//! Full protocol rounds driven through the public engine surface only.

use std::collections::BTreeMap;

use num::bigint::BigUint;

use secagg_core::{
    crypto::{pseudo_rand_lanes, PublicKey},
    field, shamir,
    wire::{bytes_to_lanes, LANE_MODULUS},
    ParticipantIndex,
};
use secagg_sdk::{RoundContext, SecAggClient, Stage};

fn spawn_clients(threshold: u32, total_clients: u32) -> Vec<SecAggClient> {
    (1..=total_clients)
        .map(|my_index| {
            SecAggClient::new(RoundContext {
                session_id: "integration".to_string(),
                round_id: 42,
                threshold,
                total_clients,
                my_index,
            })
            .unwrap()
        })
        .collect()
}

/// Plays the broadcast role of the relay server for SETUP and SHARE_KEYS.
fn exchange(clients: &mut [SecAggClient]) {
    let keys = clients
        .iter()
        .enumerate()
        .map(|(position, client)| (position as ParticipantIndex + 1, client.public_key()))
        .collect::<BTreeMap<ParticipantIndex, PublicKey>>();
    for client in clients.iter_mut() {
        client.receive_peer_public_keys(keys.clone()).unwrap();
    }

    let mut outboxes = Vec::new();
    for client in clients.iter_mut() {
        outboxes.push(client.generate_encrypted_shares().unwrap());
    }
    for (position, client) in clients.iter_mut().enumerate() {
        let me = position as ParticipantIndex + 1;
        let inbox = outboxes
            .iter()
            .enumerate()
            .filter(|(sender, _)| *sender != position)
            .map(|(sender, outbox)| (sender as ParticipantIndex + 1, outbox[&me].clone()))
            .collect();
        client.receive_encrypted_shares(inbox).unwrap();
    }
}

/// Reconstructs a client's self-mask seed from its own share accessors.
fn reconstruct_seed(client: &SecAggClient, threshold: u32) -> BigUint {
    let shares = (1..=threshold)
        .map(|index| client.own_share(index).unwrap().clone())
        .collect::<Vec<_>>();
    shamir::reconstruct(&shares).unwrap()
}

/// The aggregate the server expects after removing reconstructed self-masks.
fn assert_masks_cancel(clients: &[SecAggClient], masked: &[Vec<u8>], plaintext: &[Vec<u8>]) {
    let lanes = bytes_to_lanes(&plaintext[0]).len();
    let threshold = 2;

    let mut aggregate = vec![0_u64; lanes];
    for update in masked {
        for (sum, &lane) in aggregate.iter_mut().zip(&bytes_to_lanes(update)) {
            *sum = (*sum + lane) % LANE_MODULUS;
        }
    }

    // pairwise masks must have cancelled in the sum, leaving the plaintext
    // sum plus every participant's self-mask
    let mut expected = vec![0_u64; lanes];
    for update in plaintext {
        for (sum, &lane) in expected.iter_mut().zip(&bytes_to_lanes(update)) {
            *sum = (*sum + lane) % LANE_MODULUS;
        }
    }
    for client in clients {
        let seed = reconstruct_seed(client, threshold);
        let mask = pseudo_rand_lanes(&field::element_to_bytes(&seed), LANE_MODULUS, lanes);
        for (sum, mask) in expected.iter_mut().zip(mask) {
            *sum = (*sum + mask) % LANE_MODULUS;
        }
    }

    assert_eq!(aggregate, expected);
}

#[test]
fn test_full_round_reaches_completed() {
    let mut clients = spawn_clients(2, 3);
    exchange(&mut clients);
    for client in clients.iter_mut() {
        client.mask_model_update(&[0x11; 12]).unwrap();
        client.complete().unwrap();
        assert_eq!(client.stage(), Stage::Completed);
    }
}

#[test]
fn test_pairwise_masks_cancel_for_two() {
    let mut clients = spawn_clients(2, 2);
    exchange(&mut clients);
    let plaintext = vec![vec![0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08]; 2];
    let masked = clients
        .iter_mut()
        .zip(&plaintext)
        .map(|(client, update)| client.mask_model_update(update).unwrap())
        .collect::<Vec<_>>();
    assert_ne!(masked[0], plaintext[0]);
    assert_masks_cancel(&clients, &masked, &plaintext);
}

#[test]
fn test_pairwise_masks_cancel_for_four() {
    let mut clients = spawn_clients(2, 4);
    exchange(&mut clients);
    let plaintext = (0_u8..4)
        .map(|device| vec![device; 16])
        .collect::<Vec<_>>();
    let masked = clients
        .iter_mut()
        .zip(&plaintext)
        .map(|(client, update)| client.mask_model_update(update).unwrap())
        .collect::<Vec<_>>();
    assert_masks_cancel(&clients, &masked, &plaintext);
}

#[test]
fn test_dropout_recovery() {
    // participant 3 exchanges keys and shares but never submits a masked
    // vector; the other two reveal their shares of its seed
    let mut clients = spawn_clients(2, 3);
    exchange(&mut clients);

    let mut revealed = Vec::new();
    for survivor in 0..2 {
        clients[survivor].mask_model_update(&[0xEE; 8]).unwrap();
        let shares = clients[survivor].reveal_shares_for_dropped(&[3]).unwrap();
        revealed.push(shares[&3].clone());
    }

    // two revealed shares meet the threshold and recover the seed that
    // participant 3 split during the exchange
    let seed = shamir::reconstruct(&revealed).unwrap();
    assert_eq!(seed, reconstruct_seed(&clients[2], 2));

    // a peer this device never knew is omitted, not fabricated
    assert!(clients[0].reveal_shares_for_dropped(&[9]).unwrap().is_empty());
}
