use gridpad_core::{CellPosition, CellRange, GridState, Key, KeyOrigin, MemoryClipboard};

fn press(state: &mut GridState, key: Key) {
    state.key_down(&key, KeyOrigin::Document);
    state.key_up(&key, KeyOrigin::Document);
}

fn main() {
    let mut state = GridState::new();
    let mut clipboard = MemoryClipboard::new();

    // Type a small table by editing cells in place
    let rows = [["Name", "Days"], ["Ana", "3"], ["Bo", "5"]];
    for (row, values) in rows.iter().enumerate() {
        for (col, value) in values.iter().enumerate() {
            state.double_click(CellPosition::new(row, col));
            state.editor_input(*value).expect("editor is open");
            state.commit_edit();
        }
    }

    // Drag-select the table and copy it
    state.mouse_down(CellPosition::new(0, 0), false);
    state.mouse_over(CellPosition::new(2, 1));
    state.mouse_up();
    let text = state.copy(&mut clipboard).expect("memory clipboard");
    println!("=== Copied ===\n{text}\n");

    // Move two cells right with the keyboard and paste a duplicate
    press(&mut state, Key::ArrowRight);
    press(&mut state, Key::ArrowRight);
    let written = state.paste(&mut clipboard).expect("memory clipboard");
    println!("=== Pasted into {} cells at {} ===", written.cell_count(), written.top_left());

    // Clear the original name column
    state.mouse_down(CellPosition::new(0, 0), false);
    state.mouse_over(CellPosition::new(2, 0));
    state.mouse_up();
    press(&mut state, Key::Delete);

    println!("\n=== Grid ===");
    let window = CellRange::new(CellPosition::new(0, 0), CellPosition::new(2, 3));
    for row in window.rows() {
        let line: Vec<_> = window
            .cols()
            .map(|col| format!("{:>6}", state.store.display(row, col)))
            .collect();
        println!("{}", line.join(" |"));
    }

    println!("\n=== Snapshot ===\n{}", state.export_cells().expect("serializable"));
}
