mod common;

use std::sync::{Arc, Mutex};

use common::*;
use parlor_sessions::{
    BattleshipSessions, ConnectSessions, JoinResult, MoveOutcome, SessionError, YahtzeeSessions,
};
use parlor_types::{
    BattleshipMove, Category, ConnectGame, GuessMark, MoveRejection, Orientation, Outcome, Ship,
    ShipId, YahtzeeMove,
};

fn row_fleet() -> Vec<Ship> {
    ShipId::ALL
        .iter()
        .enumerate()
        .map(|(i, id)| Ship {
            id: *id,
            row: i * 2,
            col: 0,
            dir: Orientation::Right,
        })
        .collect()
}

#[tokio::test]
async fn test_connect_four_full_match() {
    let (store, directory) = test_store();
    let sessions = ConnectSessions::new(store, directory.clone());

    directory.create_record(&alice().uid, "Alice", false).await.unwrap();
    directory.create_record(&bob().uid, "Bob", false).await.unwrap();

    let id = sessions.create(alice()).await.unwrap();
    assert_eq!(sessions.join(&id, &bob()).await.unwrap(), JoinResult::Seated(1));

    // Alice stacks column 3 while Bob stacks column 4
    let script = [
        ("alice-uid", 3usize),
        ("bob-uid", 4),
        ("alice-uid", 3),
        ("bob-uid", 4),
        ("alice-uid", 3),
        ("bob-uid", 4),
        ("alice-uid", 3),
    ];
    let mut latest: Option<ConnectGame> = None;
    for (uid, column) in script {
        let outcome = sessions
            .submit_move(&id, &uid.to_string(), &column)
            .await
            .unwrap();
        match outcome {
            MoveOutcome::Applied(doc) => latest = Some(doc),
            MoveOutcome::Rejected(rejection) => panic!("unexpected rejection: {rejection}"),
        }
    }
    let finished = latest.unwrap();
    assert_eq!(finished.outcome, Outcome::Won { seat: 0 });
    assert_eq!(finished.board[3].height(), 4);

    // The eighth move is rejected unchanged, from either seat
    for uid in ["alice-uid", "bob-uid"] {
        let outcome = sessions
            .submit_move(&id, &uid.to_string(), &5)
            .await
            .unwrap();
        assert!(matches!(outcome, MoveOutcome::Rejected(MoveRejection::GameOver)));
    }
    let after = sessions.fetch(&id).await.unwrap();
    assert_eq!(after.board, finished.board);

    // Both directory records list the game
    let alice_record = directory.fetch(&alice().uid).await.unwrap();
    let bob_record = directory.fetch(&bob().uid).await.unwrap();
    assert!(alice_record.games.iter().any(|g| g.id == id));
    assert!(bob_record.games.iter().any(|g| g.id == id));
}

#[tokio::test]
async fn test_connect_move_before_opponent_joins_is_rejected() {
    let (store, directory) = test_store();
    let sessions = ConnectSessions::new(store, directory.clone());
    directory.create_record(&alice().uid, "Alice", false).await.unwrap();

    let id = sessions.create(alice()).await.unwrap();
    let outcome = sessions
        .submit_move(&id, &alice().uid, &3)
        .await
        .unwrap();
    assert!(matches!(
        outcome,
        MoveOutcome::Rejected(MoveRejection::OpponentMissing)
    ));
}

#[tokio::test]
async fn test_join_is_idempotent_and_bounded() {
    let (store, directory) = test_store();
    let sessions = ConnectSessions::new(store, directory.clone());
    for player in [alice(), bob(), carol()] {
        directory
            .create_record(&player.uid, &player.name, false)
            .await
            .unwrap();
    }

    let id = sessions.create(alice()).await.unwrap();
    assert_eq!(
        sessions.join(&id, &alice()).await.unwrap(),
        JoinResult::AlreadySeated(0)
    );
    assert_eq!(sessions.join(&id, &bob()).await.unwrap(), JoinResult::Seated(1));
    assert_eq!(
        sessions.join(&id, &carol()).await.unwrap(),
        JoinResult::Rejected(MoveRejection::GameFull)
    );

    // The duplicate join did not append a second directory entry
    let record = directory.fetch(&alice().uid).await.unwrap();
    assert_eq!(record.games.iter().filter(|g| g.id == id).count(), 1);
}

#[tokio::test]
async fn test_unseated_player_is_rejected() {
    let (store, directory) = test_store();
    let sessions = ConnectSessions::new(store, directory.clone());
    directory.create_record(&alice().uid, "Alice", false).await.unwrap();

    let id = sessions.create(alice()).await.unwrap();
    let outcome = sessions
        .submit_move(&id, &"stranger-uid".to_string(), &3)
        .await
        .unwrap();
    assert!(matches!(
        outcome,
        MoveOutcome::Rejected(MoveRejection::NotSeated)
    ));
}

#[tokio::test]
async fn test_stale_game_id_is_not_found() {
    let (store, directory) = test_store();
    let sessions = ConnectSessions::new(store, directory);

    let result = sessions.fetch(&"garbage-id".to_string()).await;
    assert!(matches!(result, Err(SessionError::NotFound { .. })));

    let result = sessions
        .submit_move(&"garbage-id".to_string(), &alice().uid, &3)
        .await;
    assert!(matches!(result, Err(SessionError::NotFound { .. })));
}

#[tokio::test]
async fn test_subscription_sees_every_commit() {
    let (store, directory) = test_store();
    let sessions = ConnectSessions::new(store, directory.clone());
    directory.create_record(&alice().uid, "Alice", false).await.unwrap();
    directory.create_record(&bob().uid, "Bob", false).await.unwrap();

    let id = sessions.create(alice()).await.unwrap();

    let snapshots: Arc<Mutex<Vec<ConnectGame>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&snapshots);
    let subscription = sessions.subscribe(&id, move |doc| {
        sink.lock().unwrap().push(doc);
    });

    sessions.join(&id, &bob()).await.unwrap();
    sessions.submit_move(&id, &alice().uid, &3).await.unwrap();

    let seen = snapshots.lock().unwrap();
    // Initial snapshot, the join, and the move
    assert_eq!(seen.len(), 3);
    assert!(seen[0].players[1].is_none());
    assert!(seen[1].players[1].is_some());
    assert_eq!(seen[2].board[3].height(), 1);
    drop(seen);
    drop(subscription);
}

#[tokio::test]
async fn test_yahtzee_turn_cycle() {
    let (store, directory) = test_store();
    let sessions = YahtzeeSessions::new(store, directory.clone());
    directory.create_record(&alice().uid, "Alice", false).await.unwrap();

    let id = sessions.create(alice()).await.unwrap();

    // Rolls are gated until the roster is closed
    let outcome = sessions
        .submit_move(&id, &alice().uid, &YahtzeeMove::Roll { hold: [false; 5] })
        .await
        .unwrap();
    assert!(matches!(
        outcome,
        MoveOutcome::Rejected(MoveRejection::RosterOpen)
    ));

    sessions
        .submit_move(&id, &alice().uid, &YahtzeeMove::Start)
        .await
        .unwrap();

    // Three rolls, then the fourth is refused until a score lands
    let mut dice = [0u8; 5];
    for expected in 1..=3u8 {
        let outcome = sessions
            .submit_move(&id, &alice().uid, &YahtzeeMove::Roll { hold: [false; 5] })
            .await
            .unwrap();
        let MoveOutcome::Applied(doc) = outcome else {
            panic!("roll was rejected");
        };
        assert_eq!(doc.turn.rolls, expected);
        assert!(doc.turn.dice.iter().all(|d| (1..=6).contains(d)));
        dice = doc.turn.dice;
    }
    let outcome = sessions
        .submit_move(&id, &alice().uid, &YahtzeeMove::Roll { hold: [false; 5] })
        .await
        .unwrap();
    assert!(matches!(
        outcome,
        MoveOutcome::Rejected(MoveRejection::RollsExhausted)
    ));

    let outcome = sessions
        .submit_move(
            &id,
            &alice().uid,
            &YahtzeeMove::Score {
                category: Category::Chance,
                scratch: false,
            },
        )
        .await
        .unwrap();
    let MoveOutcome::Applied(doc) = outcome else {
        panic!("score was rejected");
    };
    let expected: i32 = dice.iter().map(|&d| d as i32).sum();
    assert_eq!(doc.players[0].card.chance, Some(expected));
    assert_eq!(doc.turn.rolls, 0);
    assert_eq!(doc.turn.active, 0); // single player wraps back to themselves
}

#[tokio::test]
async fn test_battleship_placement_and_guessing() {
    let (store, directory) = test_store();
    let sessions = BattleshipSessions::new(store, directory.clone());
    directory.create_record(&alice().uid, "Alice", false).await.unwrap();
    directory.create_record(&bob().uid, "Bob", false).await.unwrap();

    let id = sessions.create(alice()).await.unwrap();
    sessions.join(&id, &bob()).await.unwrap();

    for uid in ["alice-uid", "bob-uid"] {
        let outcome = sessions
            .submit_move(
                &id,
                &uid.to_string(),
                &BattleshipMove::PlaceFleet { ships: row_fleet() },
            )
            .await
            .unwrap();
        assert!(outcome.is_applied());
    }

    // Bob cannot fire out of turn
    let outcome = sessions
        .submit_move(
            &id,
            &bob().uid,
            &BattleshipMove::Guess { row: 0, col: 0 },
        )
        .await
        .unwrap();
    assert!(matches!(
        outcome,
        MoveOutcome::Rejected(MoveRejection::NotYourTurn)
    ));

    // Alice hits the bow of Bob's two-long ship
    let outcome = sessions
        .submit_move(
            &id,
            &alice().uid,
            &BattleshipMove::Guess { row: 0, col: 0 },
        )
        .await
        .unwrap();
    let MoveOutcome::Applied(doc) = outcome else {
        panic!("guess was rejected");
    };
    assert_eq!(doc.sides[0].guesses[0][0], GuessMark::Hit);
    assert_eq!(doc.turn, 1);
}

#[tokio::test]
async fn test_concurrent_moves_commit_at_most_one() {
    let (store, directory) = test_store();
    let sessions = Arc::new(ConnectSessions::new(store, directory.clone()));
    directory.create_record(&alice().uid, "Alice", false).await.unwrap();
    directory.create_record(&bob().uid, "Bob", false).await.unwrap();

    let id = sessions.create(alice()).await.unwrap();
    sessions.join(&id, &bob()).await.unwrap();

    // Two in-flight move requests are serialized by the store; each commits
    // against the version the other produced, never a stale snapshot
    let alice_uid = alice().uid;
    let bob_uid = bob().uid;
    let (first, second) = tokio::join!(
        sessions.submit_move(&id, &alice_uid, &3),
        sessions.submit_move(&id, &bob_uid, &4),
    );
    let first = first.unwrap();
    let second = second.unwrap();
    assert!(first.is_applied());
    assert!(second.is_applied());

    let doc = sessions.fetch(&id).await.unwrap();
    assert_eq!(doc.disc_count(), 2);
    assert_eq!(doc.board[3].height(), 1);
    assert_eq!(doc.board[4].height(), 1);
}
