use super::html_opts;

fn on(o: &mut crate::Options) {
    o.extension.tasklist = true;
}

#[test]
fn task_items() {
    html_opts(
        "- [x] done\n- [ ] todo\n",
        "<ul>\n<li><input type=\"checkbox\" checked=\"\" disabled=\"\" /> done</li>\n\
         <li><input type=\"checkbox\" disabled=\"\" /> todo</li>\n</ul>\n",
        on,
    );
}

#[test]
fn uppercase_x_counts_as_checked() {
    html_opts(
        "- [X] shout\n",
        "<ul>\n<li><input type=\"checkbox\" checked=\"\" disabled=\"\" /> shout</li>\n</ul>\n",
        on,
    );
}

#[test]
fn marker_must_lead_the_item() {
    html_opts(
        "- not [x] a task\n",
        "<ul>\n<li>not [x] a task</li>\n</ul>\n",
        on,
    );
}

#[test]
fn ordered_lists_can_hold_tasks() {
    html_opts(
        "1. [x] one\n",
        "<ol>\n<li><input type=\"checkbox\" checked=\"\" disabled=\"\" /> one</li>\n</ol>\n",
        on,
    );
}

#[test]
fn disabled_by_default() {
    super::html(
        "- [x] done\n",
        "<ul>\n<li>[x] done</li>\n</ul>\n",
    );
}
