use std::fs;

use hbnb::models::*;
use hbnb::storage::FileStorage;
use speculate2::speculate;
use tempfile::TempDir;

fn stored_state(storage: &mut FileStorage, name: &str) -> String {
    let mut record = Record::new(ModelKind::State);
    record.set("name", Value::Str(name.to_string()));
    let id = record.id().to_string();
    storage.new_record(record);
    id
}

speculate! {
    before {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("file.json");
    }

    describe "reload" {
        it "starts empty when the file is absent" {
            let storage = FileStorage::open(&path);
            assert!(storage.is_empty());
        }

        it "starts empty when the file is not JSON" {
            fs::write(&path, "{not json").expect("Failed to write");
            let storage = FileStorage::open(&path);
            assert!(storage.is_empty());
        }

        it "starts empty when the top level is not an object" {
            fs::write(&path, "[1, 2, 3]").expect("Failed to write");
            let storage = FileStorage::open(&path);
            assert!(storage.is_empty());
        }

        it "skips entries with an unknown type and keeps the rest" {
            fs::write(&path, r#"{
                "Spaceship.1": {"id": "1", "created_at": "2017-09-28T21:05:54.119427",
                                "updated_at": "2017-09-28T21:05:54.119427", "__class__": "Spaceship"},
                "City.2": {"id": "2", "created_at": "2017-09-28T21:05:54.119427",
                           "updated_at": "2017-09-28T21:05:54.119427", "__class__": "City",
                           "name": "Austin"}
            }"#).expect("Failed to write");

            let storage = FileStorage::open(&path);
            assert_eq!(storage.len(), 1);
            let city = storage.get(ModelKind::City, "2").expect("City should load");
            assert_eq!(city.get("name"), Some(Value::Str("Austin".into())));
        }

        it "skips entries with malformed timestamps" {
            fs::write(&path, r#"{
                "State.1": {"id": "1", "created_at": "soon", "updated_at": "later", "__class__": "State"}
            }"#).expect("Failed to write");

            let storage = FileStorage::open(&path);
            assert!(storage.is_empty());
        }

        it "keeps unrecognized fields verbatim" {
            fs::write(&path, r#"{
                "User.u1": {"id": "u1", "created_at": "2017-09-28T21:05:54.119427",
                            "updated_at": "2017-09-28T21:05:54.119427", "__class__": "User",
                            "verified": true, "tags": ["a", "b"], "age": 30, "score": 4.5}
            }"#).expect("Failed to write");

            let storage = FileStorage::open(&path);
            let user = storage.get(ModelKind::User, "u1").expect("User should load");
            assert_eq!(user.get("verified"), Some(Value::Other(serde_json::json!(true))));
            assert_eq!(user.get("tags"), Some(Value::List(vec!["a".into(), "b".into()])));
            assert_eq!(user.get("age"), Some(Value::Int(30)));
            assert_eq!(user.get("score"), Some(Value::Float(4.5)));
            assert!(user.attributes().get(CLASS_KEY).is_none());
        }
    }

    describe "save" {
        it "writes every record keyed by type and id" {
            let mut storage = FileStorage::new(&path);
            let id = stored_state(&mut storage, "Texas");
            storage.try_save().expect("Failed to save");

            let content = fs::read_to_string(&path).expect("Failed to read");
            let json: serde_json::Value = serde_json::from_str(&content).expect("Invalid JSON");
            let entry = &json[format!("State.{}", id)];
            assert_eq!(entry["__class__"], "State");
            assert_eq!(entry["id"], id.as_str());
            assert_eq!(entry["name"], "Texas");
            assert!(entry["created_at"].as_str().expect("ISO text").contains('T'));
        }

        it "round-trips through a fresh registry" {
            let mut storage = FileStorage::new(&path);
            stored_state(&mut storage, "Texas");
            let mut place = Record::new(ModelKind::Place);
            place.set("number_rooms", Value::Int(3));
            place.set("latitude", Value::Float(30.25));
            place.set("amenity_ids", Value::List(vec!["a1".into()]));
            storage.new_record(place);
            storage.save();

            let reloaded = FileStorage::open(&path);
            assert_eq!(reloaded.len(), storage.len());
            for (key, record) in storage.all() {
                let other = reloaded.all().get(key).expect("Missing after reload");
                assert_eq!(other.to_dict(), record.to_dict());
            }
        }

        it "overwrites the whole file" {
            let mut storage = FileStorage::new(&path);
            let id = stored_state(&mut storage, "Texas");
            storage.save();
            storage.remove(ModelKind::State, &id);
            storage.save();

            let reloaded = FileStorage::open(&path);
            assert!(reloaded.is_empty());
        }

        it "swallows I/O failures" {
            let mut storage = FileStorage::new(dir.path().join("missing").join("file.json"));
            stored_state(&mut storage, "Texas");

            storage.save();
            assert!(storage.try_save().is_err());
            assert_eq!(storage.len(), 1);
        }
    }

    describe "registry" {
        it "looks records up by type and id" {
            let mut storage = FileStorage::new(&path);
            let id = stored_state(&mut storage, "Texas");

            assert!(storage.get(ModelKind::State, &id).is_some());
            assert!(storage.get(ModelKind::City, &id).is_none());
            assert!(storage.all().contains_key(&format!("State.{}", id)));
        }

        it "counts per type" {
            let mut storage = FileStorage::new(&path);
            stored_state(&mut storage, "Texas");
            stored_state(&mut storage, "Ohio");
            storage.new_record(Record::new(ModelKind::City));

            assert_eq!(storage.count(ModelKind::State), 2);
            assert_eq!(storage.count(ModelKind::City), 1);
            assert_eq!(storage.count(ModelKind::Review), 0);
        }

        it "overwrites an entry registered twice" {
            let mut storage = FileStorage::new(&path);
            let mut record = Record::new(ModelKind::Amenity);
            storage.new_record(record.clone());
            record.set("name", Value::Str("Wifi".into()));
            storage.new_record(record.clone());

            assert_eq!(storage.len(), 1);
            assert_eq!(
                storage.get(ModelKind::Amenity, record.id()).and_then(|r| r.get("name")),
                Some(Value::Str("Wifi".into()))
            );
        }

        it "keeps registration order after removal" {
            let mut storage = FileStorage::new(&path);
            let first = stored_state(&mut storage, "A");
            let second = stored_state(&mut storage, "B");
            let third = stored_state(&mut storage, "C");
            storage.remove(ModelKind::State, &second);

            let ids: Vec<&str> = storage.all().values().map(|r| r.id()).collect();
            assert_eq!(ids, vec![first.as_str(), third.as_str()]);
        }
    }
}
