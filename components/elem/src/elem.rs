//! One constructor per HTML element.
//!
//! Every constructor forwards to [`tag`] with a fixed tag name, so it accepts the same ordered
//! markup-or-child arguments:
//!
//! ```
//! use trellis_core::{markup, text};
//! use trellis_elem::{elem, prop};
//!
//! let row = elem::list_item(markup![
//!     prop::class("todo"),
//!     elem::label(markup![text("Buy milk")]),
//! ]);
//! assert_eq!(row.as_element().map(|e| e.tag()), Some("li"));
//! ```

use trellis_core::{Item, Node, tag};

macro_rules! elements {
    ($($(#[$doc:meta])* $name:ident => $tag:literal;)*) => {
        $(
            $(#[$doc])*
            pub fn $name(items: impl IntoIterator<Item = Item>) -> Node {
                tag($tag, items)
            }
        )*

        /// Tag names of every element in the catalog, in declaration order.
        pub const TAGS: &[&str] = &[$($tag),*];
    };
}

elements! {
    /// `<a>`: A hyperlink.
    anchor => "a";
    /// `<abbr>`: An abbreviation or acronym.
    abbreviation => "abbr";
    /// `<address>`: Contact information for the nearest article or body.
    address => "address";
    /// `<area>`: A clickable area inside an image map.
    area => "area";
    /// `<article>`: A self-contained composition.
    article => "article";
    /// `<aside>`: Content only indirectly related to the main content.
    aside => "aside";
    /// `<audio>`: Embedded sound content.
    audio => "audio";
    /// `<b>`: Text drawn to the reader's attention without extra importance.
    bold => "b";
    /// `<base>`: The base URL for relative URLs in the document.
    base => "base";
    /// `<bdi>`: Text isolated from the surrounding text direction.
    bidirectional_isolation => "bdi";
    /// `<bdo>`: Text with an overridden direction.
    bidirectional_override => "bdo";
    /// `<blockquote>`: An extended quotation.
    block_quote => "blockquote";
    /// `<body>`: The content of the document.
    body => "body";
    /// `<br>`: A line break.
    line_break => "br";
    /// `<button>`: A clickable button.
    button => "button";
    /// `<canvas>`: A drawing surface.
    canvas => "canvas";
    /// `<caption>`: The title of a table.
    caption => "caption";
    /// `<cite>`: The title of a cited creative work.
    citation => "cite";
    /// `<code>`: A fragment of computer code.
    code => "code";
    /// `<col>`: A column within a column group.
    column => "col";
    /// `<colgroup>`: A group of table columns.
    column_group => "colgroup";
    /// `<data>`: Content linked to a machine-readable value.
    data => "data";
    /// `<datalist>`: Permissible or recommended options for other controls.
    data_list => "datalist";
    /// `<dd>`: The description of a term in a description list.
    description => "dd";
    /// `<del>`: Text removed from the document.
    deleted_text => "del";
    /// `<details>`: A disclosure widget.
    details => "details";
    /// `<dfn>`: The term being defined.
    definition => "dfn";
    /// `<dialog>`: A dialog box or other interactive component.
    dialog => "dialog";
    /// `<div>`: A generic flow container.
    div => "div";
    /// `<dl>`: A list of term and description groups.
    description_list => "dl";
    /// `<dt>`: A term in a description list.
    definition_term => "dt";
    /// `<em>`: Stressed emphasis.
    emphasis => "em";
    /// `<embed>`: External content at this point in the document.
    embed => "embed";
    /// `<fieldset>`: A group of form controls.
    field_set => "fieldset";
    /// `<figcaption>`: The caption of a figure.
    figure_caption => "figcaption";
    /// `<figure>`: Self-contained content referenced from the main flow.
    figure => "figure";
    /// `<footer>`: The footer of the nearest sectioning element.
    footer => "footer";
    /// `<form>`: A section holding interactive controls for submitting data.
    form => "form";
    /// `<h1>`: A level 1 section heading.
    heading1 => "h1";
    /// `<h2>`: A level 2 section heading.
    heading2 => "h2";
    /// `<h3>`: A level 3 section heading.
    heading3 => "h3";
    /// `<h4>`: A level 4 section heading.
    heading4 => "h4";
    /// `<h5>`: A level 5 section heading.
    heading5 => "h5";
    /// `<h6>`: A level 6 section heading.
    heading6 => "h6";
    /// `<header>`: Introductory content.
    header => "header";
    /// `<hgroup>`: A multi-level heading.
    headings_group => "hgroup";
    /// `<hr>`: A thematic break between paragraphs.
    horizontal_rule => "hr";
    /// `<i>`: Text set off from the normal prose.
    italic => "i";
    /// `<iframe>`: A nested browsing context.
    inline_frame => "iframe";
    /// `<img>`: An image.
    image => "img";
    /// `<input>`: An interactive form control.
    input => "input";
    /// `<ins>`: Text added to the document.
    inserted_text => "ins";
    /// `<kbd>`: Text representing user input.
    keyboard_input => "kbd";
    /// `<label>`: A caption for a form control.
    label => "label";
    /// `<legend>`: A caption for a field set.
    legend => "legend";
    /// `<li>`: An item of a list.
    list_item => "li";
    /// `<link>`: A relationship to an external resource.
    link => "link";
    /// `<main>`: The dominant content of the body.
    main => "main";
    /// `<map>`: An image map.
    map => "map";
    /// `<mark>`: Highlighted text.
    mark => "mark";
    /// `<menu>`: A list of commands.
    menu => "menu";
    /// `<meta>`: Metadata not expressible by other elements.
    meta => "meta";
    /// `<meter>`: A scalar value within a known range.
    meter => "meter";
    /// `<nav>`: A section of navigation links.
    navigation => "nav";
    /// `<noscript>`: Content shown when scripting is unavailable.
    no_script => "noscript";
    /// `<object>`: An external resource.
    object => "object";
    /// `<ol>`: An ordered list.
    ordered_list => "ol";
    /// `<optgroup>`: A group of options in a select.
    options_group => "optgroup";
    /// `<option>`: An item in a select, options group or data list.
    option => "option";
    /// `<output>`: The result of a calculation or user action.
    output => "output";
    /// `<p>`: A paragraph.
    paragraph => "p";
    /// `<param>`: A parameter for an object.
    parameter => "param";
    /// `<picture>`: Alternative sources for an image.
    picture => "picture";
    /// `<pre>`: Preformatted text.
    preformatted => "pre";
    /// `<progress>`: The completion progress of a task.
    progress => "progress";
    /// `<q>`: A short inline quotation.
    quote => "q";
    /// `<rp>`: Fallback parentheses for ruby annotations.
    ruby_parenthesis => "rp";
    /// `<rt>`: The text component of a ruby annotation.
    ruby_text => "rt";
    /// `<rtc>`: Semantic annotations of ruby characters.
    ruby_text_container => "rtc";
    /// `<ruby>`: A ruby annotation.
    ruby => "ruby";
    /// `<s>`: Text that is no longer accurate.
    strikethrough => "s";
    /// `<samp>`: Sample output from a program.
    sample => "samp";
    /// `<script>`: Embedded or referenced executable code.
    script => "script";
    /// `<section>`: A generic standalone section.
    section => "section";
    /// `<select>`: A control offering a menu of options.
    select => "select";
    /// `<slot>`: A placeholder inside a web component.
    slot => "slot";
    /// `<small>`: Side comments and small print.
    small => "small";
    /// `<source>`: A media resource for a picture, audio or video.
    source => "source";
    /// `<span>`: A generic inline container.
    span => "span";
    /// `<strong>`: Content of strong importance.
    strong => "strong";
    /// `<style>`: Style information for the document.
    style => "style";
    /// `<sub>`: Subscript text.
    subscript => "sub";
    /// `<summary>`: The summary of a details element.
    summary => "summary";
    /// `<sup>`: Superscript text.
    superscript => "sup";
    /// `<table>`: Tabular data.
    table => "table";
    /// `<tbody>`: The body rows of a table.
    table_body => "tbody";
    /// `<td>`: A data cell of a table.
    table_data => "td";
    /// `<template>`: Content that is not rendered on load.
    template => "template";
    /// `<textarea>`: A multi-line text editing control.
    text_area => "textarea";
    /// `<tfoot>`: The summary rows of a table.
    table_foot => "tfoot";
    /// `<th>`: A header cell of a table.
    table_header => "th";
    /// `<thead>`: The head rows of a table.
    table_head => "thead";
    /// `<time>`: A specific period in time.
    time => "time";
    /// `<title>`: The title of the document.
    title => "title";
    /// `<tr>`: A row of table cells.
    table_row => "tr";
    /// `<track>`: Timed text tracks for media elements.
    track => "track";
    /// `<u>`: Text with a non-textual annotation.
    underline => "u";
    /// `<ul>`: An unordered list.
    unordered_list => "ul";
    /// `<var>`: A variable in a mathematical expression or program.
    variable => "var";
    /// `<video>`: Embedded video content.
    video => "video";
    /// `<wbr>`: A position where the browser may break a line.
    word_break_opportunity => "wbr";
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use trellis_core::{markup, text};

    #[test]
    fn constructors_use_their_tag() {
        assert_eq!(anchor([]).as_element().map(|e| e.tag()), Some("a"));
        assert_eq!(heading3([]).as_element().map(|e| e.tag()), Some("h3"));
        assert_eq!(text_area([]).as_element().map(|e| e.tag()), Some("textarea"));
        assert_eq!(
            word_break_opportunity([]).as_element().map(|e| e.tag()),
            Some("wbr")
        );
    }

    #[test]
    fn constructors_forward_children() {
        let list = unordered_list(markup![
            list_item(markup![text("a")]),
            None::<Node>,
            list_item(markup![text("b")]),
        ]);
        assert_eq!(list.as_element().map(|e| e.children().len()), Some(3));
    }

    #[test]
    fn catalog_has_no_duplicate_tags() {
        let unique: BTreeSet<_> = TAGS.iter().collect();
        assert_eq!(unique.len(), TAGS.len());
        assert!(TAGS.iter().all(|t| !t.is_empty()));
        let headings: Vec<_> = TAGS.iter().filter(|t| t.starts_with('h') && t.len() == 2).collect();
        assert_eq!(headings.len(), 7);
    }
}
