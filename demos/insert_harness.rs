//! Seeds a list, inserts at a few positions, then races three writers.
//!
//! Run with `cargo run --example insert_harness`.

use coupled::LockCoupledList;
use std::thread;

fn main() {
    let list = LockCoupledList::new();

    list.insert(1, 1);
    list.insert(3, 2);
    list.insert(5, 3);
    println!("Initial list:                   {list}");

    // Slot 1 is the node after the head, so position 2 lands behind `3`.
    list.insert(10, 2);
    println!("After inserting 10 at pos 2:    {list}");

    list.insert(20, 100);
    println!("After inserting 20 at pos 100:  {list}");

    thread::scope(|s| {
        for (value, pos) in [(30, 2), (40, 4), (50, 10)] {
            let list = &list;
            s.spawn(move || list.insert(value, pos));
        }
    });

    // Order among the three racing writers varies from run to run.
    println!("After concurrent inserts:       {list}");
    println!("Length: {}", list.len());
}
