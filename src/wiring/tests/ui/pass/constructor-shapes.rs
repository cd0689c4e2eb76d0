use std::convert::Infallible;
use std::fmt::Debug;
use std::io;
use std::sync::Arc;

use wiring::prelude::*;

trait Greeter: Send + Sync {
    fn greet(&self) -> String;
}

struct English;

impl Greeter for English {
    fn greet(&self) -> String {
        String::from("hello")
    }
}

fn infallible() -> Result<u8, Infallible> {
    Ok(1)
}

fn fallible(value: Arc<u8>) -> Result<u16, io::Error> {
    Ok(u16::from(*value))
}

fn main() {
    let graph = Graph::with_policy(SilentPolicy);

    let a = graph.bind(Provider::auto(infallible)).unwrap();
    let _b = graph.bind(Provider::auto(fallible)).unwrap();
    let _c = graph
        .bind(Provider::auto(|| Ok::<_, Infallible>(English)).assignable_to(|english| english as Arc<dyn Greeter>))
        .unwrap();
    let _d = graph
        .bind(Provider::auto(|greeter: Arc<dyn Greeter>, debug: Arc<dyn Debug + Send + Sync>| {
            Ok::<_, String>(format!("{} {debug:?}", greeter.greet()))
        }))
        .unwrap();
    let _e = graph
        .bind(Provider::manual(|value: Arc<u8>| Ok::<_, Box<dyn std::error::Error + Send + Sync>>(*value), [a.erase()]).unwrap())
        .unwrap();
    let _f = graph
        .bind(Provider::auto(
            |a: Arc<u8>, b: Arc<u8>, c: Arc<u8>, d: Arc<u8>, e: Arc<u8>, f: Arc<u8>,
             g: Arc<u8>, h: Arc<u8>, i: Arc<u8>, j: Arc<u8>, k: Arc<u8>, l: Arc<u8>| {
                Ok::<_, Infallible>([*a, *b, *c, *d, *e, *f, *g, *h, *i, *j, *k, *l])
            },
        ))
        .unwrap();

    let value: Arc<u8> = graph.resolve(&a).unwrap();
    assert_eq!(*value, 1);

    let erased = graph.dyn_resolve(&a.erase()).unwrap();
    assert!(erased.is::<Arc<u8>>());
    assert_eq!(graph.state(&a.erase()), TokenState::Resolved);
}
